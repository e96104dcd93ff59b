//! End-of-game verdict derived from the final stats.

use serde::{Deserialize, Serialize};
use teamsim_types::{Language, TeamStats};

/// How the project ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// High average with strong morale and productivity.
    OutstandingSuccess,
    /// Average above 60.
    Successful,
    /// Average above 40.
    BarelyFinished,
    /// Everything else.
    Failure,
}

impl Outcome {
    /// Classify final stats.
    ///
    /// Thresholds are strict: an average of exactly 60 is only
    /// [`Outcome::BarelyFinished`].
    pub fn evaluate(stats: &TeamStats) -> Self {
        let total = u32::from(stats.morale)
            .saturating_add(u32::from(stats.productivity))
            .saturating_add(u32::from(stats.cooperation));
        // Compare `total / 3 > n` as `total > 3n` to stay in integers.
        if total > 240 && stats.morale > 70 && stats.productivity > 70 {
            Self::OutstandingSuccess
        } else if total > 180 {
            Self::Successful
        } else if total > 120 {
            Self::BarelyFinished
        } else {
            Self::Failure
        }
    }

    /// Headline shown on the end screen.
    pub const fn title(self, language: Language) -> &'static str {
        match (self, language) {
            (Self::OutstandingSuccess, Language::En) => "Outstanding Success!",
            (Self::OutstandingSuccess, Language::Ko) => "엄청난 성공!",
            (Self::Successful, Language::En) => "Project Successful",
            (Self::Successful, Language::Ko) => "프로젝트 성공",
            (Self::BarelyFinished, Language::En) => "Project Barely Finished",
            (Self::BarelyFinished, Language::Ko) => "가까스로 프로젝트 완료",
            (Self::Failure, Language::En) => "Project Failure",
            (Self::Failure, Language::Ko) => "프로젝트 실패",
        }
    }

    /// Closing remark shown under the headline.
    pub const fn message(self, language: Language) -> &'static str {
        match (self, language) {
            (Self::OutstandingSuccess, Language::En) => {
                "Incredible leadership! You've fostered a highly motivated and productive team, delivering exceptional results ahead of schedule."
            }
            (Self::OutstandingSuccess, Language::Ko) => {
                "놀라운 리더십입니다! 동기 부여가 잘 되고 생산적인 팀을 만들어, 예정보다 앞서 뛰어난 결과를 만들어 냈습니다."
            }
            (Self::Successful, Language::En) => {
                "Good work, manager. The project is complete, and the team is in a decent state."
            }
            (Self::Successful, Language::Ko) => {
                "수고하셨습니다, 매니저님. 프로젝트가 완료되었고 팀 상태도 양호합니다."
            }
            (Self::BarelyFinished, Language::En) => {
                "You crossed the finish line, but it wasn't pretty. The team is feeling the strain."
            }
            (Self::BarelyFinished, Language::Ko) => {
                "결승선은 넘었지만, 과정이 순탄치 않았습니다. 팀은 지쳐있습니다."
            }
            (Self::Failure, Language::En) => {
                "Unfortunately, the project has failed. It's a tough outcome, but a valuable learning experience."
            }
            (Self::Failure, Language::Ko) => {
                "안타깝게도 프로젝트가 실패했습니다. 힘든 결과지만, 값진 학습 경험이 될 것입니다."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn stats(morale: u8, productivity: u8, cooperation: u8) -> TeamStats {
        TeamStats {
            morale,
            productivity,
            cooperation,
        }
    }

    #[test]
    fn outstanding_needs_morale_and_productivity() {
        assert_eq!(Outcome::evaluate(&stats(90, 90, 90)), Outcome::OutstandingSuccess);
        // Average 83 but morale too low.
        assert_eq!(Outcome::evaluate(&stats(70, 90, 90)), Outcome::Successful);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(Outcome::evaluate(&stats(60, 60, 60)), Outcome::BarelyFinished);
        assert_eq!(Outcome::evaluate(&stats(61, 60, 60)), Outcome::Successful);
        assert_eq!(Outcome::evaluate(&stats(40, 40, 40)), Outcome::Failure);
        assert_eq!(Outcome::evaluate(&stats(0, 0, 0)), Outcome::Failure);
    }

    #[test]
    fn titles_localized() {
        assert_eq!(Outcome::Failure.title(Language::En), "Project Failure");
        assert_eq!(Outcome::Failure.title(Language::Ko), "프로젝트 실패");
    }
}
