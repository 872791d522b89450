//! Konsolen-Treiber für [`InteractiveSession`].
//!
//! Liest Antworten zeilenweise. Durch Leerzeichen getrennte Tokens zählen als
//! einzelne Antworten, ebenso aneinandergereihte Zeichen: `1 2 Y`, `12Y` und
//! drei Zeilen sind gleichwertig. Effekte werden als Text ausgegeben, Rank-
//! und Reward-Aufrufe laufen über den [`Trainer`].

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use personalizer_core::RankBackend;
use serde::Serialize;

use crate::error::Result;
use crate::interactive::{Effect, Event, InteractiveSession, SessionState, Termination, QUIT};
use crate::runner::Trainer;

/// Was ein interaktiver Lauf getan hat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InteractiveOutcome {
    pub rank_calls: usize,
    pub rewards: usize,
    /// `true`, wenn die Sitzung per Quit-Zeichen oder Eingabeende endete.
    pub quit: bool,
}

fn render<W: Write>(out: &mut W, effect: &Effect) -> std::io::Result<()> {
    match effect {
        Effect::Menu {
            prompt, options, ..
        } => {
            writeln!(out, "{prompt}")?;
            writeln!(out, "  0. (skip)")?;
            for (i, label) in options.iter().enumerate() {
                writeln!(out, "  {}. {}", i + 1, label)?;
            }
            write!(out, "Choose 0-{} or {QUIT} to quit: ", options.len())?;
        }
        Effect::Invalid { input, reason } => {
            writeln!(out)?;
            writeln!(out, "'{}' is not valid: {}", input.trim(), reason)?;
        }
        Effect::ShowRanking { top, ranking } => {
            writeln!(out)?;
            writeln!(out, "Personalizer chose: {top}")?;
            for (i, action) in ranking.iter().enumerate() {
                match action.probability {
                    Some(p) => writeln!(out, "  {}. {} (p={:.2})", i + 1, action.id, p)?,
                    None => writeln!(out, "  {}. {}", i + 1, action.id)?,
                }
            }
        }
        Effect::AskReward { top } => {
            write!(
                out,
                "Is '{top}' a good choice? [Y]es, [N]o or a reward 0.0-1.0, {QUIT} to quit: "
            )?;
        }
        Effect::SubmitReward { value, .. } => {
            writeln!(out)?;
            writeln!(out, "Reward {value:.2} sent.")?;
        }
        Effect::Goodbye => {
            writeln!(out)?;
            writeln!(out, "Bye.")?;
        }
        Effect::Rank { .. } => {}
    }
    Ok(())
}

/// Ohne Trenner getippte Antworten (`12YQ`) werden Zeichen für Zeichen
/// gelesen, sofern schon das erste Zeichen allein eine gültige Antwort ist.
/// Zahlen bei der Belohnungsfrage werden nie zerlegt; `12` bleibt dort ungültig.
fn run_together(session: &InteractiveSession, token: &str) -> Option<Vec<String>> {
    let mut chars = token.chars();
    let first = chars.next()?;
    chars.next()?;
    let at_reward = matches!(session.state(), SessionState::AwaitingReward { .. });
    if session.accepts(token)
        || !session.accepts(first.encode_utf8(&mut [0; 4]))
        || (at_reward && token.parse::<f32>().is_ok())
    {
        return None;
    }
    Some(token.chars().map(String::from).collect())
}

/// Führt `session` über `input`/`output` bis zum Ende aus.
///
/// Struktur- und Transportfehler brechen ab und werden zurückgegeben;
/// Quit-Zeichen und Eingabeende beenden den Lauf regulär. Eine Belohnung wird
/// erst als gesendet gemeldet, wenn das Backend sie angenommen hat.
pub fn run_console<B, R, W>(
    trainer: &mut Trainer<'_, B>,
    session: &mut InteractiveSession,
    mut input: R,
    mut output: W,
) -> Result<InteractiveOutcome>
where
    B: RankBackend,
    R: BufRead,
    W: Write,
{
    let mut outcome = InteractiveOutcome::default();
    let mut queue: VecDeque<Effect> = session.start().into();
    let mut tokens: VecDeque<String> = VecDeque::new();

    loop {
        while let Some(effect) = queue.pop_front() {
            match &effect {
                Effect::Rank {
                    selections,
                    exclude,
                } => {
                    let ranking = trainer.rank(selections, exclude)?;
                    outcome.rank_calls += 1;
                    queue.extend(session.handle(Event::Ranked(&ranking)));
                }
                Effect::SubmitReward { event_id, value } => {
                    trainer.client_mut().reward(event_id, *value)?;
                    outcome.rewards += 1;
                    render(&mut output, &effect)?;
                }
                other => render(&mut output, other)?,
            }
        }
        output.flush()?;

        if session.is_terminated() {
            break;
        }

        if tokens.is_empty() {
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                queue.extend(session.handle(Event::EndOfInput));
                continue;
            }
            tokens.extend(line.split_whitespace().map(str::to_string));
            if tokens.is_empty() {
                queue.extend(session.handle(Event::Input("")));
                continue;
            }
        }

        if let Some(token) = tokens.pop_front() {
            if let Some(parts) = run_together(session, &token) {
                for part in parts.into_iter().rev() {
                    tokens.push_front(part);
                }
                continue;
            }
            queue.extend(session.handle(Event::Input(&token)));
        }
    }

    outcome.quit = matches!(session.state(), SessionState::Terminated(Termination::Quit));
    Ok(outcome)
}
