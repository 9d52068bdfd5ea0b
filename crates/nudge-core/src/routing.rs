//! Where an opened notification lands.
//!
//! Every nudge type opens the Activities view. The Suggested section is
//! highlighted while nothing is on today's schedule.

use serde::{Deserialize, Serialize};

use crate::facts::GlobalFacts;
use crate::nudge::NudgeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppView {
    Activities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRoute {
    pub view: AppView,
    pub highlight_suggested: bool,
}

pub fn open_route(nudge: NudgeType, facts: &GlobalFacts) -> OpenRoute {
    let route = OpenRoute {
        view: AppView::Activities,
        highlight_suggested: !facts.any_activity_scheduled_today,
    };
    tracing::debug!(nudge = %nudge, ?route, "open route");
    route
}

/// Navigation seam implemented by the host shell.
pub trait DeepLinkRouter {
    fn navigate(&self, route: &OpenRoute);
}
