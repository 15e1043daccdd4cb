use serde_json::Value;

use crate::types::{GameId, SignalValue};

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    Hello {
        game: GameId,
        premium: bool,
        permission: bool,
    },
    Start,
    Reset,
    Quit,
    Signal {
        value: SignalValue,
    },
    SetPremium {
        premium: bool,
    },
    DismissAd,
    Ping {
        t: f64,
    },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "hello" => {
            let game = GameId::parse(object.get("game")?.as_str()?.trim())?;
            let premium = parse_optional_bool(object.get("premium"))?.unwrap_or(false);
            let permission = parse_optional_bool(object.get("permission"))?.unwrap_or(true);
            Some(ParsedClientMessage::Hello {
                game,
                premium,
                permission,
            })
        }
        "start" => Some(ParsedClientMessage::Start),
        "reset" => Some(ParsedClientMessage::Reset),
        "quit" => Some(ParsedClientMessage::Quit),
        "dismiss_ad" => Some(ParsedClientMessage::DismissAd),
        "set_premium" => {
            let premium = object.get("premium")?.as_bool()?;
            Some(ParsedClientMessage::SetPremium { premium })
        }
        "signal" => {
            let position = object.get("position");
            let open = object.get("open");
            let value = match (position, open) {
                (Some(position), None) => SignalValue::Position(position.as_f64()? as f32),
                (None, Some(open)) => SignalValue::Violation(open.as_bool()?),
                _ => return None,
            };
            Some(ParsedClientMessage::Signal { value })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

fn parse_optional_bool(value: Option<&Value>) -> Option<Option<bool>> {
    match value {
        None => Some(None),
        Some(value) => value.as_bool().map(Some),
    }
}
