//! Permission resolver — decides ALLOW or DENY for a (distributor, location) pair.
//!
//! Flow:  location lookup → ancestor walk (most specific first, exclude before
//! include at each level) → parent distributor → default deny.
//!
//! The walk is pure; trace output goes through a [`ResolutionObserver`] so the
//! decision never depends on how (or whether) it is reported.

use serde::Serialize;
use std::fmt;

use crate::distributor::{Distributor, DistributorRegistry};
use crate::region::RegionCatalog;

/// Why a verdict was reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionReason {
    /// The location code is not in the catalog.
    UnknownLocation,
    /// The distributor name is not registered.
    UnknownDistributor,
    /// `distributor` excludes `region`, the closest matching ancestor.
    Excluded { distributor: String, region: String },
    /// `distributor` includes `region`, the closest matching ancestor.
    Included { distributor: String, region: String },
    /// No distributor in the chain has a rule for any ancestor.
    DefaultDeny,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownLocation => write!(f, "unknown location"),
            Self::UnknownDistributor => write!(f, "unknown distributor"),
            Self::Excluded { distributor, region } => write!(f, "{} excludes {}", distributor, region),
            Self::Included { distributor, region } => write!(f, "{} includes {}", distributor, region),
            Self::DefaultDeny => write!(f, "no matching rule"),
        }
    }
}

/// A verdict with its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl Decision {
    fn deny(reason: DecisionReason) -> Self {
        Self { allowed: false, reason }
    }
}

// ─── Observability hook ─────────────────────────────────────────

/// Trace events emitted while resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionEvent<'a> {
    Checking { distributor: &'a str, location: &'a str },
    UnknownLocation { location: &'a str },
    UnknownDistributor { distributor: &'a str },
    Visiting { distributor: &'a str, region: &'a str },
    Matched { distributor: &'a str, region: &'a str, allowed: bool },
    FallbackToParent { distributor: &'a str, parent: &'a str },
    DefaultDeny { distributor: &'a str, location: &'a str },
}

pub trait ResolutionObserver {
    fn observe(&self, event: &ResolutionEvent<'_>);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ResolutionObserver for NoopObserver {
    fn observe(&self, _event: &ResolutionEvent<'_>) {}
}

/// Forwards events to `tracing` at debug/trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ResolutionObserver for TracingObserver {
    fn observe(&self, event: &ResolutionEvent<'_>) {
        match *event {
            ResolutionEvent::Checking { distributor, location } => {
                tracing::debug!(distributor, location, "checking permission")
            }
            ResolutionEvent::UnknownLocation { location } => {
                tracing::debug!(location, "unknown region")
            }
            ResolutionEvent::UnknownDistributor { distributor } => {
                tracing::debug!(distributor, "unknown distributor")
            }
            ResolutionEvent::Visiting { distributor, region } => {
                tracing::trace!(distributor, region, "checking region")
            }
            ResolutionEvent::Matched { distributor, region, allowed } => {
                tracing::debug!(distributor, region, allowed, "rule matched")
            }
            ResolutionEvent::FallbackToParent { distributor, parent } => {
                tracing::debug!(distributor, parent, "no rule matched, deferring to parent")
            }
            ResolutionEvent::DefaultDeny { distributor, location } => {
                tracing::debug!(distributor, location, "no rule matched, denying")
            }
        }
    }
}

// ─── Resolver ───────────────────────────────────────────────────

/// Read-only view over a catalog and a registry.
pub struct PermissionResolver<'a> {
    catalog: &'a RegionCatalog,
    registry: &'a DistributorRegistry,
    observer: &'a dyn ResolutionObserver,
}

impl<'a> PermissionResolver<'a> {
    pub fn new(catalog: &'a RegionCatalog, registry: &'a DistributorRegistry) -> Self {
        Self {
            catalog,
            registry,
            observer: &NoopObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn ResolutionObserver) -> Self {
        self.observer = observer;
        self
    }

    /// ALLOW/DENY only.
    pub fn has_permission(&self, distributor: &str, location: &str) -> bool {
        self.explain(distributor, location).allowed
    }

    /// Resolve and report which rule (if any) decided the outcome.
    pub fn explain(&self, distributor: &str, location: &str) -> Decision {
        self.observer.observe(&ResolutionEvent::Checking { distributor, location });

        if self.catalog.lookup(location).is_none() {
            self.observer.observe(&ResolutionEvent::UnknownLocation { location });
            return Decision::deny(DecisionReason::UnknownLocation);
        }

        let chain = self.registry.chain(distributor);
        if chain.is_empty() {
            self.observer.observe(&ResolutionEvent::UnknownDistributor { distributor });
            return Decision::deny(DecisionReason::UnknownDistributor);
        }

        let mut previous: Option<&Distributor> = None;
        for &current in &chain {
            if let Some(child) = previous {
                self.observer.observe(&ResolutionEvent::FallbackToParent {
                    distributor: &child.name,
                    parent: &current.name,
                });
            }
            if let Some(decision) = self.match_rules(current, location) {
                return decision;
            }
            previous = Some(current);
        }

        self.observer.observe(&ResolutionEvent::DefaultDeny {
            distributor: previous.map_or(distributor, |d| d.name.as_str()),
            location,
        });
        Decision::deny(DecisionReason::DefaultDeny)
    }

    /// Walk the ancestors of `location` against one distributor's own rules.
    fn match_rules(&self, distributor: &Distributor, location: &str) -> Option<Decision> {
        let rules = &distributor.permissions;
        for region in self.catalog.ancestors_of(location) {
            self.observer.observe(&ResolutionEvent::Visiting {
                distributor: &distributor.name,
                region: &region.code,
            });

            let allowed = if rules.is_excluded(&region.code) {
                false
            } else if rules.is_included(&region.code) {
                true
            } else {
                continue;
            };

            self.observer.observe(&ResolutionEvent::Matched {
                distributor: &distributor.name,
                region: &region.code,
                allowed,
            });
            let (distributor, region) = (distributor.name.clone(), region.code.clone());
            let reason = if allowed {
                DecisionReason::Included { distributor, region }
            } else {
                DecisionReason::Excluded { distributor, region }
            };
            return Some(Decision { allowed, reason });
        }
        None
    }
}
