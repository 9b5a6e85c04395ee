//! Consistency resolution: attach stored identity data to a shot plan.
//!
//! Pure over its inputs. Every reference either resolves to the
//! identity's captured description and seed, or degrades to `None`
//! (sentinel refs and unknown ids alike) -- a signal to invent fresh
//! details for that panel, never an error. The registry snapshot is
//! read-only here.

use std::collections::HashMap;

use panelforge_core::identity::{is_ad_hoc_ref, VisualIdentity};
use panelforge_core::plan::{CharacterDirective, LocationDirective, ShotPlan};
use panelforge_core::scene::StructuredScene;
use panelforge_core::types::Seed;

/// A shot-plan character with its resolved identity data, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterContext {
    pub directive: CharacterDirective,
    /// The identity's captured description; `None` means invent fresh.
    pub description: Option<StructuredScene>,
    pub seed: Option<Seed>,
}

/// The shot-plan location with its resolved identity data, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationContext {
    pub directive: LocationDirective,
    pub description: Option<StructuredScene>,
    pub seed: Option<Seed>,
}

/// Everything the asset synthesizer needs beyond the shot plan itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContext {
    pub characters: Vec<CharacterContext>,
    pub location: LocationContext,
}

/// Resolve a shot plan's identity references against a registry snapshot.
pub fn resolve(shot_plan: &ShotPlan, registry: &HashMap<String, VisualIdentity>) -> ResolvedContext {
    let characters = shot_plan
        .characters
        .iter()
        .map(|directive| {
            let identity = lookup(registry, &directive.identity_ref);
            CharacterContext {
                directive: directive.clone(),
                description: identity.map(|i| i.structured_description.clone()),
                seed: identity.and_then(|i| i.seed),
            }
        })
        .collect();

    let location_identity = lookup(registry, &shot_plan.location.identity_ref);
    let location = LocationContext {
        directive: shot_plan.location.clone(),
        description: location_identity.map(|i| i.structured_description.clone()),
        seed: location_identity.and_then(|i| i.seed),
    };

    ResolvedContext {
        characters,
        location,
    }
}

fn lookup<'a>(
    registry: &'a HashMap<String, VisualIdentity>,
    identity_ref: &str,
) -> Option<&'a VisualIdentity> {
    if is_ad_hoc_ref(identity_ref) {
        return None;
    }
    registry.get(identity_ref)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
