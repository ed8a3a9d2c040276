//! Classification results, verdicts and recorded outcomes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binary eye state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EyeState {
    /// Eyelids open.
    Open,
    /// Eyelids closed.
    Closed,
}

impl EyeState {
    /// Maps a classifier output index to a state: 0 is `Closed`, 1 is `Open`.
    #[must_use]
    pub const fn from_class_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Closed),
            1 => Some(Self::Open),
            _ => None,
        }
    }

    /// Label used on the wire and in storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for EyeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EyeState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Closed" => Ok(Self::Closed),
            other => Err(format!("unknown eye state '{other}'")),
        }
    }
}

/// What the posture check concluded for a closed-eye frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureFinding {
    /// Torso is closer to horizontal than vertical.
    LyingDown,
    /// Torso is not reclined enough.
    Upright,
    /// No body pose was found.
    Undetected,
}

impl PostureFinding {
    /// Storage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LyingDown => "lying_down",
            Self::Upright => "upright",
            Self::Undetected => "undetected",
        }
    }
}

impl FromStr for PostureFinding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lying_down" => Ok(Self::LyingDown),
            "upright" => Ok(Self::Upright),
            "undetected" => Ok(Self::Undetected),
            other => Err(format!("unknown posture finding '{other}'")),
        }
    }
}

/// Why closed eyes were not confirmed as sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnconfirmedReason {
    /// A pose was found and it is not lying down.
    Upright,
    /// No pose was found.
    NoPoseDetected,
}

/// Outcome of one successful assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SleepVerdict {
    /// Eyes open; posture was not consulted.
    Open,
    /// Eyes closed and the subject is lying down.
    ClosedConfirmed,
    /// Eyes closed without posture corroboration.
    ClosedUnconfirmed(UnconfirmedReason),
}

impl SleepVerdict {
    /// The classified eye state.
    #[must_use]
    pub const fn eye_state(self) -> EyeState {
        match self {
            Self::Open => EyeState::Open,
            Self::ClosedConfirmed | Self::ClosedUnconfirmed(_) => EyeState::Closed,
        }
    }

    /// `None` for open eyes, otherwise whether sleep was confirmed.
    #[must_use]
    pub const fn sleep_confirmed(self) -> Option<bool> {
        match self {
            Self::Open => None,
            Self::ClosedConfirmed => Some(true),
            Self::ClosedUnconfirmed(_) => Some(false),
        }
    }

    /// Posture finding, if posture was consulted.
    #[must_use]
    pub const fn posture(self) -> Option<PostureFinding> {
        match self {
            Self::Open => None,
            Self::ClosedConfirmed => Some(PostureFinding::LyingDown),
            Self::ClosedUnconfirmed(UnconfirmedReason::Upright) => Some(PostureFinding::Upright),
            Self::ClosedUnconfirmed(UnconfirmedReason::NoPoseDetected) => {
                Some(PostureFinding::Undetected)
            }
        }
    }
}

/// JSON body returned for a prediction.
///
/// `sleep_confirmed` is omitted entirely for open eyes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// `"Open"` or `"Closed"`.
    pub eye_state: EyeState,
    /// Present only when the eyes are closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_confirmed: Option<bool>,
}

impl From<SleepVerdict> for PredictionResponse {
    fn from(verdict: SleepVerdict) -> Self {
        Self {
            eye_state: verdict.eye_state(),
            sleep_confirmed: verdict.sleep_confirmed(),
        }
    }
}

/// A recorded observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SleepOutcome {
    recorded_at: DateTime<Utc>,
    prediction: EyeState,
    sleep_confirmed: Option<bool>,
    posture: Option<PostureFinding>,
}

impl SleepOutcome {
    /// Builds the record for `verdict` stamped at `recorded_at`.
    #[must_use]
    pub const fn new(verdict: SleepVerdict, recorded_at: DateTime<Utc>) -> Self {
        Self {
            recorded_at,
            prediction: verdict.eye_state(),
            sleep_confirmed: verdict.sleep_confirmed(),
            posture: verdict.posture(),
        }
    }

    /// Rebuilds a record read back from storage.
    #[must_use]
    pub const fn from_parts(
        recorded_at: DateTime<Utc>,
        prediction: EyeState,
        sleep_confirmed: Option<bool>,
        posture: Option<PostureFinding>,
    ) -> Self {
        Self {
            recorded_at,
            prediction,
            sleep_confirmed,
            posture,
        }
    }

    /// When the outcome was recorded.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// The eye state.
    #[must_use]
    pub const fn prediction(&self) -> EyeState {
        self.prediction
    }

    /// Whether sleep was confirmed; `None` for open eyes.
    #[must_use]
    pub const fn sleep_confirmed(&self) -> Option<bool> {
        self.sleep_confirmed
    }

    /// Posture finding; `None` for open eyes and for legacy records.
    #[must_use]
    pub const fn posture(&self) -> Option<PostureFinding> {
        self.posture
    }
}
