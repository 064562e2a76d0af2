//! The `loganalyst difficulty` command.

use anyhow::Result;

use loganalyst_core::engine;

pub fn execute(score: u32, streak: u32, accuracy: u32) -> Result<()> {
    anyhow::ensure!(accuracy <= 100, "accuracy must be between 0 and 100");

    let index = engine::performance_index(score, streak, accuracy);
    let tier = engine::next_difficulty(score, streak, accuracy);

    println!("Performance index: {index:.1}");
    println!("Difficulty: {tier}");
    println!("Time budget: {}s", engine::time_budget(tier));
    println!("Base points: {}", engine::base_points(tier));
    println!("Based on score: {score}, streak: {streak}, accuracy: {accuracy}%");
    Ok(())
}
