//! Control input carried over the `controls` data channel.
//!
//! Frames are JSON text, one event per frame, sent as soon as the player
//! touches something:
//!
//! - `{"type":"gamepad","inputType":"button","code":"A","value":1}`
//! - `{"type":"gamepad","inputType":"axis","index":0,"value":-0.42}`
//! - `{"type":"keyboard","key":"Space","state":"down"}`
//! - `{"type":"mouse","dx":3,"dy":-1,"buttons":0}`
//!
//! The channel is unordered and unreliable, so there are no sequence numbers.
//! A late frame simply overwrites a newer value; only the latest value per
//! control is meaningful.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    Gamepad(GamepadInput),
    Keyboard(KeyboardInput),
    Mouse(MouseInput),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GamepadInputType {
    Button,
    Axis,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GamepadInput {
    pub input_type: GamepadInputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum KeyState {
    Down,
    Up,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyboardInput {
    pub key: String,
    pub state: KeyState,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MouseInput {
    pub dx: f64,
    pub dy: f64,
    #[serde(default)]
    pub buttons: u32,
}

/// Identifies one physical control; the unit of last-value-wins.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControlKey {
    Button {
        code: Option<String>,
        index: Option<u32>,
    },
    Axis {
        code: Option<String>,
        index: Option<u32>,
    },
    Key(String),
    MouseDelta,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    Scalar(f64),
    Key(KeyState),
    Delta { dx: f64, dy: f64, buttons: u32 },
}

impl ControlMessage {
    pub fn button(code: impl Into<String>, value: f64) -> Self {
        Self::Gamepad(GamepadInput {
            input_type: GamepadInputType::Button,
            code: Some(code.into()),
            index: None,
            value,
        })
    }

    pub fn axis(index: u32, value: f64) -> Self {
        Self::Gamepad(GamepadInput {
            input_type: GamepadInputType::Axis,
            code: None,
            index: Some(index),
            value,
        })
    }

    pub fn decode(frame: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(frame)
    }

    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn key(&self) -> ControlKey {
        match self {
            Self::Gamepad(input) => {
                let code = input.code.clone();
                let index = input.index;
                match input.input_type {
                    GamepadInputType::Button => ControlKey::Button { code, index },
                    GamepadInputType::Axis => ControlKey::Axis { code, index },
                }
            }
            Self::Keyboard(input) => ControlKey::Key(input.key.clone()),
            Self::Mouse(_) => ControlKey::MouseDelta,
        }
    }

    pub fn value(&self) -> ControlValue {
        match self {
            Self::Gamepad(input) => ControlValue::Scalar(input.value),
            Self::Keyboard(input) => ControlValue::Key(input.state),
            Self::Mouse(input) => ControlValue::Delta {
                dx: input.dx,
                dy: input.dy,
                buttons: input.buttons,
            },
        }
    }
}

/// Latest value seen for every control of one player.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    latest: HashMap<ControlKey, ControlValue>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `msg`, returning the value it replaced.
    pub fn apply(&mut self, msg: &ControlMessage) -> Option<ControlValue> {
        self.latest.insert(msg.key(), msg.value())
    }

    pub fn get(&self, key: &ControlKey) -> Option<ControlValue> {
        self.latest.get(key).copied()
    }

    pub fn is_pressed(&self, code: &str) -> bool {
        let key = ControlKey::Button {
            code: Some(code.to_owned()),
            index: None,
        };
        matches!(self.get(&key), Some(ControlValue::Scalar(v)) if v > 0.0)
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    pub fn clear(&mut self) {
        self.latest.clear();
    }
}
