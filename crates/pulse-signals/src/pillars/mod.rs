//! Signal definitions, one module per pillar.
//!
//! Every pillar module exposes one constructor per signal and a `signals()`
//! function returning its three members in canonical order.

pub mod breadth;
pub mod credit;
pub mod direction;
pub mod global;
pub mod sentiment;
pub mod volatility;

use pulse_traits::PillarKey;

use crate::rule::StepSignal;

/// The three signals of a pillar.
#[must_use]
pub fn signals_for(pillar: PillarKey) -> [StepSignal; 3] {
    match pillar {
        PillarKey::Direction => direction::signals(),
        PillarKey::Breadth => breadth::signals(),
        PillarKey::Volatility => volatility::signals(),
        PillarKey::Credit => credit::signals(),
        PillarKey::Sentiment => sentiment::signals(),
        PillarKey::Global => global::signals(),
    }
}
