//! One assistant turn: the model plans an action, the action runs against the
//! menu or the reservation book, and the outcome becomes the reply.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::menu::{format_matches, search_menu};
use super::prompts::{ASSISTANT_PROMPT, ASSISTANT_SYSTEM};
use super::reservations::{
    format_reservation_details, party_size, NewReservation, ReservationBook, ReservationChanges,
    ReservationQuery,
};
use super::{ChatError, ChatSettings};
use crate::errors::AppError;
use crate::extraction::{extract_json_object, JsonObject};
use crate::llm_client::{ModelInvoker, ModelRequest};
use crate::storage::{ObjectStore, RecordStore};

pub const DEFAULT_REPLY: &str = "How can I help you with our menu or a reservation today?";

/// The model's answer when it is well formed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionPlan {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub arguments: JsonObject,
    #[serde(default)]
    pub reply: String,
}

#[derive(Debug, Clone)]
pub enum ChatAction {
    SearchMenu {
        query: String,
    },
    MakeReservation(NewReservation),
    FindReservation(ReservationQuery),
    ModifyReservation {
        reservation_id: String,
        changes: ReservationChanges,
    },
    CancelReservation {
        reservation_id: String,
    },
    Reply,
}

impl ChatAction {
    /// Reads the planned action and its arguments. Unknown actions fall back
    /// to a plain reply.
    pub fn from_plan(plan: &ActionPlan) -> Result<Self, ChatError> {
        let args = &plan.arguments;
        let action = match plan.action.trim() {
            "search_menu" => Self::SearchMenu {
                query: required(args, "query")?,
            },
            "make_reservation" => Self::MakeReservation(NewReservation {
                customer_name: required(args, "customer_name")?,
                party_size: party_size(args.get("party_size").unwrap_or(&Value::Null))?,
                date: required(args, "date")?,
                time: required(args, "time")?,
                phone: optional(args, "phone").unwrap_or_default(),
                email: optional(args, "email").unwrap_or_default(),
            }),
            "find_reservation" => Self::FindReservation(ReservationQuery {
                reservation_id: optional(args, "reservation_id"),
                customer_name: optional(args, "customer_name"),
                phone: optional(args, "phone"),
            }),
            "modify_reservation" => Self::ModifyReservation {
                reservation_id: required(args, "reservation_id")?,
                changes: ReservationChanges {
                    new_date: optional(args, "new_date"),
                    new_time: optional(args, "new_time"),
                    new_party_size: match args.get("new_party_size") {
                        None | Some(Value::Null) => None,
                        Some(Value::String(s)) if s.trim().is_empty() => None,
                        Some(value) => Some(party_size(value)?),
                    },
                },
            },
            "cancel_reservation" => Self::CancelReservation {
                reservation_id: required(args, "reservation_id")?,
            },
            "reply" | "" => Self::Reply,
            other => {
                warn!(action = other, "Unknown assistant action, replying directly");
                Self::Reply
            }
        };
        Ok(action)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::SearchMenu { .. } => "search_menu",
            Self::MakeReservation(_) => "make_reservation",
            Self::FindReservation(_) => "find_reservation",
            Self::ModifyReservation { .. } => "modify_reservation",
            Self::CancelReservation { .. } => "cancel_reservation",
            Self::Reply => "reply",
        }
    }

    /// Shown when the action fails for a reason the customer cannot fix.
    fn apology(&self) -> &'static str {
        match self {
            Self::SearchMenu { .. } => {
                "I'm having trouble searching our menu right now. Please try again later or ask our staff directly."
            }
            Self::MakeReservation(_) => {
                "I'm sorry, I couldn't complete your reservation. Please try again or call us directly."
            }
            Self::FindReservation(_) => {
                "I'm having trouble accessing reservation information right now. Please try again later."
            }
            Self::ModifyReservation { .. } => {
                "I couldn't update your reservation. Please try again or call us directly."
            }
            Self::CancelReservation { .. } => {
                "I couldn't cancel your reservation. Please try again or call us directly."
            }
            Self::Reply => DEFAULT_REPLY,
        }
    }
}

fn optional(args: &JsonObject, key: &str) -> Option<String> {
    match args.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required(args: &JsonObject, key: &str) -> Result<String, ChatError> {
    optional(args, key).ok_or_else(|| ChatError::InvalidRequest(format!("I need the {} to do that.", key.replace('_', " "))))
}

/// One customer message.
#[derive(Debug, Clone)]
pub struct ChatTurn<'a> {
    pub message: &'a str,
    pub customer_id: &'a str,
    pub session_id: &'a str,
}

pub struct RestaurantAssistant<'a> {
    objects: &'a dyn ObjectStore,
    store: &'a dyn RecordStore,
    model: &'a dyn ModelInvoker,
    settings: &'a ChatSettings,
}

impl<'a> RestaurantAssistant<'a> {
    pub fn new(
        objects: &'a dyn ObjectStore,
        store: &'a dyn RecordStore,
        model: &'a dyn ModelInvoker,
        settings: &'a ChatSettings,
    ) -> Self {
        Self {
            objects,
            store,
            model,
            settings,
        }
    }

    /// Answers one message. Only a failed model call is an error; tool
    /// failures are folded into the reply.
    pub async fn respond(&self, turn: &ChatTurn<'_>) -> Result<String, AppError> {
        let prompt = ASSISTANT_PROMPT
            .replace("{customer_id}", turn.customer_id)
            .replace("{session_id}", turn.session_id)
            .replace("{timestamp}", &Utc::now().to_rfc3339())
            .replace("{message}", turn.message);
        let request = ModelRequest::new(ASSISTANT_SYSTEM, prompt).with_max_tokens(self.settings.max_tokens);

        let raw = self
            .model
            .invoke(&request)
            .await
            .map_err(|e| AppError::Llm(format!("assistant call failed: {e}")))?;

        let Some(plan) = extract_json_object(&raw)
            .and_then(|object| serde_json::from_value::<ActionPlan>(Value::Object(object)).ok())
        else {
            info!(customer_id = turn.customer_id, "Assistant answered in prose");
            return Ok(non_empty_or_default(raw.trim()));
        };

        let action = match ChatAction::from_plan(&plan) {
            Ok(action) => action,
            Err(e) => return Ok(compose(&plan.reply, &e.to_string())),
        };
        info!(customer_id = turn.customer_id, action = action.name(), "Assistant action planned");

        if matches!(action, ChatAction::Reply) {
            return Ok(non_empty_or_default(plan.reply.trim()));
        }

        let outcome = match self.run(&action).await {
            Ok(text) => text,
            Err(e @ (ChatError::ReservationNotFound(_) | ChatError::InvalidRequest(_))) => e.to_string(),
            Err(e) => {
                warn!(action = action.name(), "Assistant action failed: {e}");
                action.apology().to_string()
            }
        };
        Ok(compose(&plan.reply, &outcome))
    }

    async fn run(&self, action: &ChatAction) -> Result<String, ChatError> {
        let book = ReservationBook::new(self.store, &self.settings.reservations);
        match action {
            ChatAction::SearchMenu { query } => {
                let matches = search_menu(
                    self.objects,
                    &self.settings.bucket,
                    &self.settings.menu_prefix,
                    query,
                )
                .await?;
                Ok(format_matches(query, &matches))
            }
            ChatAction::MakeReservation(request) => {
                let reservation = book.make(request.clone()).await?;
                Ok(format!(
                    "Reservation confirmed!\n\n{}\n\nPlease arrive 15 minutes early. To modify or cancel, \
                     use your reservation ID: {}",
                    format_reservation_details(&reservation),
                    reservation.reservation_id
                ))
            }
            ChatAction::FindReservation(query) => {
                let found = book.find(query).await?;
                if found.is_empty() {
                    return Ok(no_matches(query));
                }
                Ok(found
                    .iter()
                    .map(format_reservation_details)
                    .collect::<Vec<_>>()
                    .join("\n\n"))
            }
            ChatAction::ModifyReservation {
                reservation_id,
                changes,
            } => {
                let updated = book.modify(reservation_id, changes.clone()).await?;
                Ok(format!(
                    "Reservation updated successfully!\n\n{}",
                    format_reservation_details(&updated)
                ))
            }
            ChatAction::CancelReservation { reservation_id } => {
                let cancelled = book.cancel(reservation_id).await?;
                Ok(format!(
                    "Reservation {} has been cancelled successfully. We hope to see you again soon!",
                    cancelled.reservation_id
                ))
            }
            ChatAction::Reply => Ok(String::new()),
        }
    }
}

fn no_matches(query: &ReservationQuery) -> String {
    let mut terms = Vec::new();
    if let Some(name) = &query.customer_name {
        terms.push(format!("name '{name}'"));
    }
    if let Some(phone) = &query.phone {
        terms.push(format!("phone '{phone}'"));
    }
    format!("No reservations found for {}.", terms.join(" or "))
}

fn compose(reply: &str, outcome: &str) -> String {
    let reply = reply.trim();
    if reply.is_empty() {
        outcome.to_string()
    } else {
        format!("{reply}\n\n{outcome}")
    }
}

fn non_empty_or_default(text: &str) -> String {
    if text.is_empty() {
        DEFAULT_REPLY.to_string()
    } else {
        text.to_string()
    }
}
