pub mod apply_ctx;
pub mod apply_engine;

pub use apply_ctx::ApplyCtx;
pub use apply_engine::{
    apply_locators, classify_affordance, success_locator, AffordanceKind, ApplyEngine, ApplyPolicy,
    PopupAction, PopupStep, AFFORDANCE_RULES,
};
