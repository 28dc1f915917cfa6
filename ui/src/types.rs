//! Schema types re-exported from `clashboard` (the shared schema crate).

pub use clashboard::{
    ApiRequest, ClashError, ClashId, ClashMessage, ClashSnapshot, ClashboardConfig,
    CreatedResponse, ErrorResponse, Field, MapStatUpdate, MapStats, NewPlayerRequest, Player,
    PlayerId, RankingEntry, decode_body, format_score,
};
