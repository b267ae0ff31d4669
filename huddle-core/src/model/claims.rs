use serde::{Deserialize, Serialize};

use crate::model::signal::RoleKind;

/// Session identity issued by the auth service, carried by every
/// client-originated action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub name: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "roomID")]
    pub room_id: String,
    pub role: RoleKind,
}
