//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Prompt, PromptId, ReviewOutcome};
use crate::review::{ReviewItem, ReviewQueueMode, ReviewSyncReport};
use crate::store::{ListStatus, PromptStore};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    OpenDocument {
        document: String,
    },
    CloseDocument {
        document: String,
    },
    ReloadDocument {
        document: String,
    },
    SavePrompt {
        document: String,
        id: PromptId,
    },
    SaveAll {
        document: String,
        ids: Vec<PromptId>,
    },
    UnsavePrompt {
        document: String,
        id: PromptId,
    },
    DeletePrompt {
        document: String,
        id: PromptId,
    },
    UpdateFront {
        document: String,
        id: PromptId,
        text: String,
    },
    UpdateBack {
        document: String,
        id: PromptId,
        text: String,
    },
    CreatePrompt {
        document: String,
        #[serde(default)]
        id: Option<PromptId>,
        prompt: Prompt,
    },
    ReviewOutcomes {
        document: String,
        outcomes: Vec<ReviewOutcome>,
    },
    StartReview {
        document: String,
        queue: ReviewQueueMode,
        #[serde(default, rename = "baseUri")]
        base_uri: Option<String>,
    },
    Due {
        document: String,
    },
    ListStatus {
        document: String,
        ids: Vec<PromptId>,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Prompts(PromptsOut),
    Created {
        id: PromptId,
        snapshot: PromptsOut,
    },
    ReviewSynced {
        report: ReviewSyncReport,
        snapshot: PromptsOut,
    },
    ReviewQueue(ReviewQueueOut),
    Due(DueOut),
    ListStatus(ListStatus),
    Closed {
        document: String,
    },
    Error {
        message: String,
    },
}

/// Full state of one document's prompts, with the due set recomputed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptsOut {
    pub document: String,
    pub prompts: PromptStore,
    pub due: Vec<PromptId>,
}

/// Build the snapshot DTO for a store.
pub fn to_out(document: &str, store: &PromptStore) -> PromptsOut {
    PromptsOut {
        document: document.to_string(),
        prompts: store.clone(),
        due: store.due_ids(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DueOut {
    pub document: String,
    pub due: Vec<PromptId>,
    pub count: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewQueueOut {
    pub document: String,
    pub items: Vec<ReviewItem>,
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    pub document: String,
}

#[derive(Debug, Deserialize)]
pub struct DocumentIn {
    pub document: String,
}

#[derive(Debug, Deserialize)]
pub struct PromptIdIn {
    pub document: String,
    pub id: PromptId,
}

#[derive(Debug, Deserialize)]
pub struct PromptIdsIn {
    pub document: String,
    pub ids: Vec<PromptId>,
}

#[derive(Debug, Deserialize)]
pub struct PromptTextIn {
    pub document: String,
    pub id: PromptId,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePromptIn {
    pub document: String,
    #[serde(default)]
    pub id: Option<PromptId>,
    pub prompt: Prompt,
}

#[derive(Debug, Serialize)]
pub struct CreatedOut {
    pub id: PromptId,
    pub snapshot: PromptsOut,
}

#[derive(Debug, Deserialize)]
pub struct ReviewOutcomesIn {
    pub document: String,
    pub outcomes: Vec<ReviewOutcome>,
}

#[derive(Debug, Serialize)]
pub struct ReviewSyncedOut {
    pub report: ReviewSyncReport,
    pub snapshot: PromptsOut,
}

#[derive(Debug, Deserialize)]
pub struct ReviewQueueIn {
    pub document: String,
    pub queue: ReviewQueueMode,
    /// The reader's page URL; relative image sources resolve against it.
    #[serde(default, rename = "baseUri")]
    pub base_uri: Option<String>,
}

#[derive(Serialize)]
pub struct ClosedOut {
    pub document: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
