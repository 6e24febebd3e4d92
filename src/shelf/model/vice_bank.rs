//! Vice bank: a token economy. Users earn tokens by depositing completed
//! actions and spend them on purchases.

use super::schema::{Field, FieldKind};
use super::{timestamp, Entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViceBankUser {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub current_tokens: f64,
    pub date_added: DateTime<Utc>,
}

impl Entity for ViceBankUser {
    const KIND: &'static str = "vice_bank_users";
    const LABEL: &'static str = "vice bank user";
    const NATURAL_KEY: &'static str = "id";
    const SCHEMA: &'static [Field] = &[
        Field::required("id", FieldKind::NonEmptyString),
        Field::required("userId", FieldKind::NonEmptyString),
        Field::required("name", FieldKind::NonEmptyString),
        Field::required("currentTokens", FieldKind::Number),
        Field::required("dateAdded", FieldKind::DateTime),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.id
    }

    fn added_at(&self) -> DateTime<Utc> {
        self.date_added
    }

    fn name(&self) -> &str {
        &self.name
    }

    /// New users start with an empty balance unless one is given.
    fn prepare_new(raw: &mut Map<String, Value>, id: &str, now: DateTime<Utc>) {
        raw.insert("id".to_string(), Value::String(id.to_string()));
        if raw.get("dateAdded").map_or(true, Value::is_null) {
            raw.insert("dateAdded".to_string(), Value::String(timestamp(now)));
        }
        if raw.get("currentTokens").map_or(true, Value::is_null) {
            raw.insert("currentTokens".to_string(), Value::from(0));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub id: String,
    pub vb_user_id: String,
    pub deposit_quantity: f64,
    pub conversion_rate: f64,
    pub action_name: String,
    pub conversion_unit: String,
    pub tokens_earned: f64,
    pub date_added: DateTime<Utc>,
}

impl Entity for Deposit {
    const KIND: &'static str = "deposits";
    const LABEL: &'static str = "deposit";
    const NATURAL_KEY: &'static str = "id";
    const SCHEMA: &'static [Field] = &[
        Field::required("id", FieldKind::NonEmptyString),
        Field::required("vbUserId", FieldKind::NonEmptyString),
        Field::required("depositQuantity", FieldKind::Number),
        Field::required("conversionRate", FieldKind::Number),
        Field::required("actionName", FieldKind::NonEmptyString),
        Field::required("conversionUnit", FieldKind::String),
        Field::required("tokensEarned", FieldKind::Number),
        Field::required("dateAdded", FieldKind::DateTime),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.id
    }

    fn added_at(&self) -> DateTime<Utc> {
        self.date_added
    }

    fn name(&self) -> &str {
        &self.action_name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: String,
    pub vb_user_id: String,
    pub purchased_name: String,
    pub purchased_quantity: f64,
    pub tokens_spent: f64,
    pub date_added: DateTime<Utc>,
}

impl Entity for Purchase {
    const KIND: &'static str = "purchases";
    const LABEL: &'static str = "purchase";
    const NATURAL_KEY: &'static str = "id";
    const SCHEMA: &'static [Field] = &[
        Field::required("id", FieldKind::NonEmptyString),
        Field::required("vbUserId", FieldKind::NonEmptyString),
        Field::required("purchasedName", FieldKind::NonEmptyString),
        Field::required("purchasedQuantity", FieldKind::Number),
        Field::required("tokensSpent", FieldKind::Number),
        Field::required("dateAdded", FieldKind::DateTime),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn key(&self) -> &str {
        &self.id
    }

    fn added_at(&self) -> DateTime<Utc> {
        self.date_added
    }

    fn name(&self) -> &str {
        &self.purchased_name
    }
}
