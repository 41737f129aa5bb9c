//! Threat-level transition rules (spec §4.E). Pure function over the
//! session's current level and streak counters plus the latest response
//! classification; [`super::policy::AntiDetectionCoordinator::observe`] is
//! the only caller that applies the result to a live session.

use crate::model::session::{ResponseClassification, ThreatLevel};

/// Two repeated block/CAPTCHA classifications while already at `orange`
/// escalate to `red` (spec "repeated orange without recovery ⇒ red").
const REPEATED_BLOCK_THRESHOLD: u32 = 2;

/// Five consecutive clean responses step the level down by one (spec "N
/// consecutive green responses ⇒ step down one level", N≈5).
const CONSECUTIVE_CLEAN_TO_STEP_DOWN: u32 = 5;

pub struct ThreatTransition {
    pub level: ThreatLevel,
    pub consecutive_green: u32,
    pub consecutive_orange: u32,
}

pub fn next_threat_level(
    current: ThreatLevel,
    consecutive_green: u32,
    consecutive_orange: u32,
    classification: ResponseClassification,
) -> ThreatTransition {
    use ResponseClassification::*;

    match classification {
        Results | NotFound => {
            let green = consecutive_green + 1;
            if green >= CONSECUTIVE_CLEAN_TO_STEP_DOWN && current != ThreatLevel::Green {
                ThreatTransition {
                    level: current.step_down(),
                    consecutive_green: 0,
                    consecutive_orange: 0,
                }
            } else {
                ThreatTransition {
                    level: current,
                    consecutive_green: green,
                    consecutive_orange: 0,
                }
            }
        }
        ClientError { status } if status != 404 => ThreatTransition {
            level: current.max(ThreatLevel::Yellow),
            consecutive_green: 0,
            consecutive_orange,
        },
        RateLimited { .. } => ThreatTransition {
            level: current.max(ThreatLevel::Yellow),
            consecutive_green: 0,
            consecutive_orange,
        },
        Blocked { .. } | Captcha => {
            let orange = consecutive_orange + 1;
            let level = if current == ThreatLevel::Red {
                ThreatLevel::Red
            } else if current == ThreatLevel::Orange && orange >= REPEATED_BLOCK_THRESHOLD {
                ThreatLevel::Red
            } else {
                ThreatLevel::Orange
            };
            ThreatTransition {
                level,
                consecutive_green: 0,
                consecutive_orange: orange,
            }
        }
        ClientError { .. } /* 404 */ | ServerError { .. } => ThreatTransition {
            level: current,
            consecutive_green: 0,
            consecutive_orange,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_404_client_error_escalates_to_at_least_yellow() {
        let t = next_threat_level(ThreatLevel::Green, 0, 0, ResponseClassification::ClientError { status: 401 });
        assert_eq!(t.level, ThreatLevel::Yellow);
    }

    #[test]
    fn not_found_does_not_escalate() {
        let t = next_threat_level(ThreatLevel::Green, 0, 0, ResponseClassification::ClientError { status: 404 });
        assert_eq!(t.level, ThreatLevel::Green);
    }

    #[test]
    fn repeated_orange_escalates_to_red() {
        let first = next_threat_level(ThreatLevel::Orange, 0, 1, ResponseClassification::Blocked { status: 403 });
        assert_eq!(first.level, ThreatLevel::Red);
    }

    #[test]
    fn five_consecutive_clean_responses_step_down_one_level() {
        let mut level = ThreatLevel::Orange;
        let mut green = 0;
        let mut orange = 0;
        for _ in 0..5 {
            let t = next_threat_level(level, green, orange, ResponseClassification::Results);
            level = t.level;
            green = t.consecutive_green;
            orange = t.consecutive_orange;
        }
        assert_eq!(level, ThreatLevel::Yellow);
    }

    #[test]
    fn first_block_from_green_only_reaches_orange() {
        let t = next_threat_level(ThreatLevel::Green, 0, 0, ResponseClassification::Blocked { status: 403 });
        assert_eq!(t.level, ThreatLevel::Orange);
    }
}
