//! Interaktives Training als expliziter Zustandsautomat.
//!
//! Die Sitzung kennt kein Terminal. Jeder Übergang nimmt den aktuellen Zustand
//! und ein [`Event`] und liefert den Folgezustand plus eine Liste von
//! [`Effect`]s; ein Treiber (siehe [`crate::console`]) gibt Prompts aus und
//! führt die angeforderten Rank-/Reward-Aufrufe durch.

use personalizer_core::{RankedAction, Selection, Selections};

use crate::catalog::FeatureCatalog;
use crate::client::Ranking;
use crate::error::{Result, TrainingError};

/// Eingabe, die die Sitzung an jedem Prompt beendet.
pub const QUIT: char = 'Q';

/// Ein Feature, wie es im Auswahlmenü erscheint.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuFeature {
    pub name: String,
    pub prompt: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Quit-Zeichen eingegeben (oder Eingabe zu Ende).
    Quit,
    /// Belohnung gesendet, keine weitere Runde gewünscht.
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Wartet auf die Antwort zu `menu[index]`; `chosen` enthält die bisherigen
    /// 1-basierten Antworten (0 = übersprungen).
    AwaitingSelection { index: usize, chosen: Vec<usize> },
    /// Rank-Anfrage ist raus, Ergebnis steht aus.
    Ranking,
    AwaitingReward { event_id: String, top: String },
    Terminated(Termination),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event<'a> {
    Input(&'a str),
    Ranked(&'a Ranking),
    EndOfInput,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Frage nach einem Feature. Option `i` (1-basiert) ist `options[i - 1]`.
    Menu {
        feature: String,
        prompt: String,
        options: Vec<String>,
    },
    Invalid { input: String, reason: String },
    Rank {
        selections: Selections,
        exclude: Vec<String>,
    },
    ShowRanking {
        top: String,
        ranking: Vec<RankedAction>,
    },
    AskReward { top: String },
    SubmitReward { event_id: String, value: f32 },
    Goodbye,
}

/// Wie viele Rank-/Reward-Runden eine Sitzung läuft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounds {
    #[default]
    Single,
    /// Nach jeder Belohnung von vorn, bis das Quit-Zeichen kommt.
    UntilQuit,
}

#[derive(Debug, Clone)]
pub struct InteractiveSession {
    menu: Vec<MenuFeature>,
    exclude: Vec<String>,
    rounds: Rounds,
    state: SessionState,
}

fn is_quit(input: &str) -> bool {
    let mut chars = input.trim().chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.eq_ignore_ascii_case(&QUIT))
}

fn parse_reward(input: &str) -> Option<f32> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(1.0),
        "n" | "no" => Some(0.0),
        other => other
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite() && (0.0..=1.0).contains(v)),
    }
}

impl InteractiveSession {
    /// Bereitet eine Sitzung vor, die `select` der Reihe nach abfragt und ohne
    /// `exclude` rankt.
    pub fn new<S: AsRef<str>>(
        catalog: &FeatureCatalog,
        select: &[S],
        exclude: Vec<String>,
    ) -> Result<Self> {
        if select.is_empty() {
            return Err(TrainingError::InvalidRequest(
                "interactive training needs at least one selectable feature",
            ));
        }
        let menu = select
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let feature = catalog
                    .get(name)
                    .ok_or_else(|| TrainingError::UnknownFeature(name.to_string()))?;
                Ok(MenuFeature {
                    name: feature.name.clone(),
                    prompt: feature.prompt(),
                    labels: feature.values.iter().map(|v| v.label.clone()).collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            menu,
            exclude,
            rounds: Rounds::Single,
            state: SessionState::AwaitingSelection {
                index: 0,
                chosen: Vec::new(),
            },
        })
    }

    pub fn with_rounds(mut self, rounds: Rounds) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, SessionState::Terminated(_))
    }

    /// Effekte beim Betreten des Anfangszustands.
    pub fn start(&self) -> Vec<Effect> {
        match &self.state {
            SessionState::AwaitingSelection { index, .. } => vec![self.menu_effect(*index)],
            SessionState::AwaitingReward { top, .. } => vec![Effect::AskReward { top: top.clone() }],
            _ => Vec::new(),
        }
    }

    /// `true`, wenn `input` im aktuellen Zustand als Antwort gilt (inklusive
    /// Quit-Zeichen). Rein; der Zustand bleibt unverändert.
    pub fn accepts(&self, input: &str) -> bool {
        match &self.state {
            SessionState::Ranking | SessionState::Terminated(_) => false,
            _ if is_quit(input) => true,
            SessionState::AwaitingSelection { index, .. } => input
                .trim()
                .parse::<usize>()
                .is_ok_and(|c| c <= self.menu[*index].labels.len()),
            SessionState::AwaitingReward { .. } => parse_reward(input).is_some(),
        }
    }

    /// Wendet ein Event an und schaltet die Sitzung weiter.
    pub fn handle(&mut self, event: Event<'_>) -> Vec<Effect> {
        let state = std::mem::replace(&mut self.state, SessionState::Terminated(Termination::Quit));
        let (next, effects) = self.transition(state, event);
        self.state = next;
        effects
    }

    fn menu_effect(&self, index: usize) -> Effect {
        let feature = &self.menu[index];
        Effect::Menu {
            feature: feature.name.clone(),
            prompt: feature.prompt.clone(),
            options: feature.labels.clone(),
        }
    }

    fn restart(&self) -> (SessionState, Vec<Effect>) {
        (
            SessionState::AwaitingSelection {
                index: 0,
                chosen: Vec::new(),
            },
            vec![self.menu_effect(0)],
        )
    }

    fn selections(&self, chosen: &[usize]) -> Selections {
        self.menu
            .iter()
            .zip(chosen)
            .map(|(feature, &i)| {
                let selection = match i {
                    0 => Selection::Skip,
                    i => Selection::Label(feature.labels[i - 1].clone()),
                };
                (feature.name.clone(), selection)
            })
            .collect()
    }

    fn transition(&self, state: SessionState, event: Event<'_>) -> (SessionState, Vec<Effect>) {
        if let Event::Input(text) = event {
            if is_quit(text) && !matches!(state, SessionState::Terminated(_) | SessionState::Ranking) {
                return (SessionState::Terminated(Termination::Quit), vec![Effect::Goodbye]);
            }
        }
        if event == Event::EndOfInput && !matches!(state, SessionState::Terminated(_)) {
            return (SessionState::Terminated(Termination::Quit), vec![Effect::Goodbye]);
        }

        match (state, event) {
            (SessionState::AwaitingSelection { index, mut chosen }, Event::Input(text)) => {
                let max = self.menu[index].labels.len();
                let choice = text.trim().parse::<usize>().ok().filter(|c| *c <= max);
                let Some(choice) = choice else {
                    return (
                        SessionState::AwaitingSelection { index, chosen },
                        vec![
                            Effect::Invalid {
                                input: text.to_string(),
                                reason: format!("enter a number from 0 to {max} or {QUIT} to quit"),
                            },
                            self.menu_effect(index),
                        ],
                    );
                };
                chosen.push(choice);
                if index + 1 < self.menu.len() {
                    return (
                        SessionState::AwaitingSelection {
                            index: index + 1,
                            chosen,
                        },
                        vec![self.menu_effect(index + 1)],
                    );
                }
                if chosen.iter().all(|c| *c == 0) {
                    let (next, mut effects) = self.restart();
                    effects.insert(
                        0,
                        Effect::Invalid {
                            input: text.to_string(),
                            reason: "select at least one feature".into(),
                        },
                    );
                    return (next, effects);
                }
                (
                    SessionState::Ranking,
                    vec![Effect::Rank {
                        selections: self.selections(&chosen),
                        exclude: self.exclude.clone(),
                    }],
                )
            }
            (SessionState::Ranking, Event::Ranked(ranking)) => {
                let top = ranking.top().to_string();
                (
                    SessionState::AwaitingReward {
                        event_id: ranking.event_id.clone(),
                        top: top.clone(),
                    },
                    vec![
                        Effect::ShowRanking {
                            top: top.clone(),
                            ranking: ranking.ranking.clone(),
                        },
                        Effect::AskReward { top },
                    ],
                )
            }
            (SessionState::AwaitingReward { event_id, top }, Event::Input(text)) => match parse_reward(text) {
                Some(value) => {
                    let submit = Effect::SubmitReward { event_id, value };
                    match self.rounds {
                        Rounds::Single => (SessionState::Terminated(Termination::Completed), vec![submit]),
                        Rounds::UntilQuit => {
                            let (next, mut effects) = self.restart();
                            effects.insert(0, submit);
                            (next, effects)
                        }
                    }
                }
                None => (
                    SessionState::AwaitingReward {
                        event_id,
                        top: top.clone(),
                    },
                    vec![
                        Effect::Invalid {
                            input: text.to_string(),
                            reason: "answer Y, N or a number between 0.0 and 1.0".into(),
                        },
                        Effect::AskReward { top },
                    ],
                ),
            },
            // Alles andere (Eingabe während des Rankings, Events nach dem Ende)
            // lässt den Zustand unverändert.
            (state, _) => (state, Vec::new()),
        }
    }
}
