use crate::model::client::ClientId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Relay body that asks the server to re-admit a sender who lost membership.
pub const RECONNECT_MARKER: &str = r#"{"type":"reconnect"}"#;

/// Everything the server ever sends to a client.
///
/// Lifecycle variants serialize with a `type` tag, relays as a bare
/// `{"from", "data"}` pair:
///
/// ```text
/// {"type":"connected","peer":"lobby==…","clients":["lobby==…"]}
/// {"type":"disconnected","peer":"lobby==…","clients":[]}
/// {"type":"full","clients":["lobby==…","lobby==…"]}
/// {"from":"lobby==…","data":"v=0 …"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Envelope", into = "Envelope")]
pub enum SignalMessage {
    Connected {
        peer: ClientId,
        clients: Vec<ClientId>,
    },
    Disconnected {
        peer: ClientId,
        clients: Vec<ClientId>,
    },
    Full {
        clients: Vec<ClientId>,
    },
    Relay {
        from: ClientId,
        data: Value,
    },
}

impl SignalMessage {
    pub fn is_reconnect(body: &[u8]) -> bool {
        body == RECONNECT_MARKER.as_bytes()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    peer: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    clients: Option<Vec<ClientId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl From<SignalMessage> for Envelope {
    fn from(msg: SignalMessage) -> Self {
        let empty = Envelope {
            kind: None,
            peer: None,
            clients: None,
            from: None,
            data: None,
        };

        match msg {
            SignalMessage::Connected { peer, clients } => Envelope {
                kind: Some("connected".to_owned()),
                peer: Some(peer),
                clients: Some(clients),
                ..empty
            },
            SignalMessage::Disconnected { peer, clients } => Envelope {
                kind: Some("disconnected".to_owned()),
                peer: Some(peer),
                clients: Some(clients),
                ..empty
            },
            SignalMessage::Full { clients } => Envelope {
                kind: Some("full".to_owned()),
                clients: Some(clients),
                ..empty
            },
            SignalMessage::Relay { from, data } => Envelope {
                from: Some(from),
                data: Some(data),
                ..empty
            },
        }
    }
}

impl TryFrom<Envelope> for SignalMessage {
    type Error = String;

    fn try_from(env: Envelope) -> Result<Self, Self::Error> {
        let clients = env.clients.unwrap_or_default();

        match env.kind.as_deref() {
            Some("connected") => Ok(SignalMessage::Connected {
                peer: env.peer.ok_or("connected envelope without peer")?,
                clients,
            }),
            Some("disconnected") => Ok(SignalMessage::Disconnected {
                peer: env.peer.ok_or("disconnected envelope without peer")?,
                clients,
            }),
            Some("full") => Ok(SignalMessage::Full { clients }),
            Some(other) => Err(format!("unknown envelope type {other:?}")),
            None => Ok(SignalMessage::Relay {
                from: env.from.ok_or("relay envelope without from")?,
                data: env.data.unwrap_or(Value::Null),
            }),
        }
    }
}
