//! The `loganalyst play` command.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use loganalyst_core::countdown::{Countdown, TICK};
use loganalyst_core::fallback::LocalService;
use loganalyst_core::{ControllerConfig, ControllerError, Phase, RoundController, TickOutcome};

use loganalyst_providers::create_service;

use super::ServiceArgs;
use crate::render;

/// Every this many seconds the remaining time is printed.
const ANNOUNCE_EVERY_SECS: u32 = 10;
/// Announce every second once the clock is this low.
const FINAL_COUNTDOWN_SECS: u32 = 5;

pub async fn execute(args: ServiceArgs) -> Result<()> {
    let config = args.resolve()?;
    let remote = create_service(&config.service)?;
    let mut controller = RoundController::new(
        remote,
        Arc::new(LocalService::new()),
        ControllerConfig {
            request_timeout: config.request_timeout(),
            start_degraded: config.offline,
        },
    );
    tracing::info!(
        session = controller.session_id(),
        service = %config.service.base_url,
        offline = config.offline,
        "session started"
    );

    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    run_session(&mut controller, input, &mut out).await
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Empty line.
    Continue,
    /// `c <n>`: 1-based technique index.
    Classify(usize),
    /// `m <n>`: 1-based mitigation index.
    Mitigate(usize),
    Submit,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Command::Continue;
    };
    let index = parts.next().and_then(|n| n.parse::<usize>().ok());
    let extra = parts.next().is_some();

    match (head.to_ascii_lowercase().as_str(), index, extra) {
        ("c", Some(n), false) if n > 0 => Command::Classify(n),
        ("m", Some(n), false) if n > 0 => Command::Mitigate(n),
        ("s", None, false) => Command::Submit,
        ("q", None, false) => Command::Quit,
        _ => Command::Unknown(line.trim().to_string()),
    }
}

enum Event {
    Input(Option<String>),
    Tick(Option<()>),
}

/// Drive the controller from line-oriented input until quit or end of input.
async fn run_session<R, W>(controller: &mut RoundController, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut countdown: Option<Countdown> = None;

    render::welcome(out, controller.is_degraded())?;

    loop {
        let event = match countdown.as_mut() {
            Some(clock) => tokio::select! {
                line = lines.next_line() => Event::Input(line?),
                tick = clock.tick() => Event::Tick(tick),
            },
            None => Event::Input(lines.next_line().await?),
        };

        match event {
            Event::Tick(None) => countdown = None,
            Event::Tick(Some(())) => match controller.tick().await {
                TickOutcome::Running(secs) => {
                    if secs % ANNOUNCE_EVERY_SECS == 0 || secs <= FINAL_COUNTDOWN_SECS {
                        render::remaining(out, secs)?;
                    }
                }
                TickOutcome::Expired => {
                    stop(&mut countdown);
                    if let Some(feedback) = controller.feedback() {
                        render::feedback(out, feedback, controller.stats())?;
                    }
                }
                TickOutcome::Idle => stop(&mut countdown),
            },
            Event::Input(None) => break,
            Event::Input(Some(line)) => {
                let command = parse_command(&line);
                if command == Command::Quit {
                    break;
                }
                match controller.phase() {
                    Phase::Welcome | Phase::Feedback => {
                        if let Command::Unknown(text) = &command {
                            writeln!(out, "Unrecognised input '{text}'. Press Enter to continue.")?;
                            continue;
                        }
                        controller.start_round().await?;
                        if let Some(round) = controller.round() {
                            render::round(out, round, controller.stats())?;
                            countdown = Some(Countdown::start(round.number, TICK));
                        }
                    }
                    Phase::Playing => {
                        if play_command(controller, command, out).await? {
                            stop(&mut countdown);
                        }
                    }
                }
            }
        }
    }

    stop(&mut countdown);
    render::summary(out, controller.stats(), controller.is_degraded())?;
    Ok(())
}

fn stop(countdown: &mut Option<Countdown>) {
    if let Some(mut clock) = countdown.take() {
        clock.cancel();
    }
}

/// Apply a command during play. Returns `true` once the round was graded.
async fn play_command<W: Write>(
    controller: &mut RoundController,
    command: Command,
    out: &mut W,
) -> Result<bool> {
    let Some(round) = controller.round() else {
        return Ok(false);
    };

    match command {
        Command::Classify(n) => {
            match round.challenge.classification_options.get(n - 1) {
                Some(option) => {
                    let id = option.id.clone();
                    controller.select_classification(&id)?;
                    writeln!(out, "Technique {n} selected: {id}")?;
                }
                None => writeln!(out, "There is no technique {n}.")?,
            }
            Ok(false)
        }
        Command::Mitigate(n) => {
            match round.challenge.mitigation_options.get(n - 1) {
                Some(id) => {
                    let id = id.clone();
                    controller.select_mitigation(&id)?;
                    writeln!(out, "Mitigation {n} selected: {}", render::mitigation_text(&id))?;
                }
                None => writeln!(out, "There is no mitigation {n}.")?,
            }
            Ok(false)
        }
        Command::Submit => match controller.submit().await {
            Ok(feedback) => {
                let feedback = feedback.clone();
                render::feedback(out, &feedback, controller.stats())?;
                Ok(true)
            }
            Err(ControllerError::IncompleteSelection) => {
                writeln!(out, "Select both a technique (c <n>) and a mitigation (m <n>) first.")?;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        },
        Command::Continue => Ok(false),
        Command::Quit | Command::Unknown(_) => {
            writeln!(out, "Commands: c <n>, m <n>, s, q")?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::AsyncWriteExt;

    use loganalyst_core::fallback;
    use loganalyst_core::Tier;
    use loganalyst_providers::mock::MockService;

    use super::*;

    fn easy_answer() -> (String, String) {
        (
            fallback::techniques_for(Tier::Easy)[0].id.clone(),
            fallback::mitigations_for(Tier::Easy)[0].clone(),
        )
    }

    fn online_controller(service: Arc<MockService>) -> RoundController {
        RoundController::new(service, Arc::new(LocalService::seeded(5)), ControllerConfig::default())
    }

    async fn play(controller: &mut RoundController, script: &str) -> String {
        let mut out = Vec::new();
        run_session(controller, script.as_bytes(), &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command(""), Command::Continue);
        assert_eq!(parse_command("  "), Command::Continue);
        assert_eq!(parse_command("c 2"), Command::Classify(2));
        assert_eq!(parse_command("M 4"), Command::Mitigate(4));
        assert_eq!(parse_command("s"), Command::Submit);
        assert_eq!(parse_command("q"), Command::Quit);
        assert_eq!(parse_command("c 0"), Command::Unknown("c 0".into()));
        assert_eq!(parse_command("c two"), Command::Unknown("c two".into()));
        assert_eq!(parse_command("s now"), Command::Unknown("s now".into()));
    }

    #[tokio::test]
    async fn correct_answer_online() {
        let (technique, mitigation) = easy_answer();
        let service = Arc::new(MockService::new(&technique, &mitigation, 35));
        let mut controller = online_controller(service.clone());

        let text = play(&mut controller, "\nc 1\nm 1\ns\nq\n").await;
        assert!(text.contains("Round 1: Correct"), "{text}");
        assert!(text.contains("Points: +35"));
        assert!(text.contains("Achievement unlocked: First Log"));
        assert_eq!(service.grade_count(), 1);
        assert_eq!(controller.stats().score, 35);
    }

    #[tokio::test]
    async fn submit_requires_both_selections() {
        let (technique, mitigation) = easy_answer();
        let service = Arc::new(MockService::new(&technique, &mitigation, 35));
        let mut controller = online_controller(service.clone());

        let text = play(&mut controller, "\nc 1\ns\nc 9\nq\n").await;
        assert!(text.contains("Select both a technique"));
        assert!(text.contains("There is no technique 9."));
        assert_eq!(service.grade_count(), 0);
        assert_eq!(controller.stats().total_attempts, 0);
    }

    #[tokio::test]
    async fn failed_fetch_switches_to_offline_mode() {
        let service = Arc::new(MockService::new("T1110", "block_ip", 35).failing_fetch());
        let mut controller = online_controller(service.clone());

        let text = play(&mut controller, "\nc 2\nm 3\ns\n\nq\n").await;
        assert!(text.contains("OFFLINE MODE"));
        assert!(text.contains("Graded locally"));
        assert!(text.contains("Round 2"));
        assert_eq!(service.fetch_count(), 1);
        assert_eq!(service.grade_count(), 0);
    }

    #[tokio::test]
    async fn end_of_input_prints_summary() {
        let service = Arc::new(MockService::new("T1110", "block_ip", 35));
        let mut controller = online_controller(service);

        let text = play(&mut controller, "\nc 1\n").await;
        assert!(text.contains("Rounds"));
        assert!(text.contains("online"));
        assert_eq!(controller.phase(), Phase::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_expiry_submits_automatically() {
        let mut controller = RoundController::new(
            Arc::new(MockService::new("T1110", "block_ip", 35)),
            Arc::new(LocalService::seeded(5)),
            ControllerConfig {
                start_degraded: true,
                ..ControllerConfig::default()
            },
        );
        let (reader, mut writer) = tokio::io::duplex(64);
        let mut out = Vec::new();

        let user = async move {
            writer.write_all(b"\n").await.unwrap();
            tokio::time::sleep(Duration::from_secs(61)).await;
            writer.write_all(b"q\n").await.unwrap();
        };
        let (result, ()) = tokio::join!(
            run_session(&mut controller, BufReader::new(reader), &mut out),
            user
        );
        result.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Time remaining: 50s"));
        assert!(text.contains("Time remaining: 3s"));
        assert!(!text.contains("Time remaining: 7s"));
        assert!(text.contains("Round 1: Time expired"));
        assert!(text.contains("Points: +0"));
        assert_eq!(controller.stats().total_attempts, 1);
    }
}
