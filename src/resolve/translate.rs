//! GUID translation: mapping override identifiers onto symbol descendants.
//!
//! Override entries name their targets with identifiers from another
//! session than the symbol's own nodes, so they rarely match verbatim.
//! The mapping is recovered heuristically in sequential phases, each one
//! only touching what the previous phases left unclaimed:
//!
//! 1. **Offset voting** - sessions with three or more override ids vote on
//!    a single local-id offset between override and descendant ids.
//!    Votes whose sizes disagree too much are dropped again.
//! 2. **Sorted fallback** - leftovers of those sessions hinted TEXT or
//!    INSTANCE pair in local-id order with free nodes of that type.
//! 3. **Size groups** - any leftover carrying a size pairs with free nodes
//!    of the same rounded size.
//! 4. **Small sessions** - sessions with one or two ids pair by type hint.
//! 5. **Sibling swap** - optional correction for variant switches that
//!    landed on a hidden node next to a visible twin.
//!
//! A descendant is claimed at most once and an override id maps at most
//! once. That state is a [`MatchState`] value threaded through the phase
//! functions.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::{Guid, Size};
use crate::node::OverrideEntry;
use super::classify::{OverrideProfile, TypeHint};
use super::descendants::DescendantInfo;
use super::options::ResolveOptions;

// ============================================================================
// TRANSLATION MAP
// ============================================================================

/// Override identifier → symbol descendant identifier.
///
/// Empty means no translation is needed (or possible); every lookup then
/// misses and overrides pass through unchanged.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct GuidTranslationMap {
    map: IndexMap<Guid, Guid>,
}

impl GuidTranslationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one override identifier.
    pub fn get(&self, from: Guid) -> Option<Guid> {
        self.map.get(&from).copied()
    }

    pub fn contains(&self, from: Guid) -> bool {
        self.map.contains_key(&from)
    }

    /// Pairs in the order the phases produced them.
    pub fn iter(&self) -> impl Iterator<Item = (Guid, Guid)> + '_ {
        self.map.iter().map(|(&from, &to)| (from, to))
    }

    /// Mapped descendant identifiers.
    pub fn targets(&self) -> impl Iterator<Item = Guid> + '_ {
        self.map.values().copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The map with canonical `session:local` string keys and values.
    pub fn to_canonical(&self) -> Vec<(String, String)> {
        self.iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect()
    }
}

impl fmt::Debug for GuidTranslationMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.map.iter().map(|(from, to)| (from.to_string(), to.to_string())))
            .finish()
    }
}

impl FromIterator<(Guid, Guid)> for GuidTranslationMap {
    fn from_iter<I: IntoIterator<Item = (Guid, Guid)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// MATCH STATE
// ============================================================================

/// Claim bookkeeping carried from one phase to the next.
#[derive(Clone, Debug, Default)]
struct MatchState {
    map: IndexMap<Guid, Guid>,
    claimed_overrides: FxHashSet<Guid>,
    claimed_descendants: FxHashSet<Guid>,
}

impl MatchState {
    fn override_free(&self, guid: Guid) -> bool {
        !self.claimed_overrides.contains(&guid)
    }

    fn descendant_free(&self, guid: Guid) -> bool {
        !self.claimed_descendants.contains(&guid)
    }

    /// Record `from → to` unless either side is taken.
    fn claim(&mut self, from: Guid, to: Guid) -> bool {
        if !self.override_free(from) || !self.descendant_free(to) {
            return false;
        }
        tracing::trace!(%from, %to, "matched");
        self.claimed_overrides.insert(from);
        self.claimed_descendants.insert(to);
        self.map.insert(from, to);
        true
    }

    /// Claim both sides as an identity match, without a map entry.
    fn claim_identity(&mut self, guid: Guid) {
        self.claimed_overrides.insert(guid);
        self.claimed_descendants.insert(guid);
    }

    /// Undo a mapping, freeing both sides.
    fn release(&mut self, from: Guid) {
        if let Some(to) = self.map.shift_remove(&from) {
            self.claimed_overrides.remove(&from);
            self.claimed_descendants.remove(&to);
        }
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Read-only inputs shared by every phase.
struct TranslationContext<'a> {
    descendants: &'a [DescendantInfo],
    profile: &'a OverrideProfile,
    options: &'a ResolveOptions,
    by_guid: FxHashMap<Guid, usize>,
    /// Local id → descendant positions, preorder.
    by_local: FxHashMap<u32, Vec<usize>>,
    /// Override ids still needing translation, by session, each sorted.
    sessions: BTreeMap<u32, Vec<Guid>>,
}

impl<'a> TranslationContext<'a> {
    fn new(
        descendants: &'a [DescendantInfo],
        profile: &'a OverrideProfile,
        options: &'a ResolveOptions,
    ) -> Self {
        let mut by_guid = FxHashMap::default();
        let mut by_local: FxHashMap<u32, Vec<usize>> = FxHashMap::default();
        for (idx, d) in descendants.iter().enumerate() {
            by_guid.entry(d.guid).or_insert(idx);
            by_local.entry(d.guid.local_id).or_default().push(idx);
        }
        let mut sessions: BTreeMap<u32, Vec<Guid>> = BTreeMap::new();
        for id in profile.ids() {
            if !by_guid.contains_key(&id) {
                sessions.entry(id.session_id).or_default().push(id);
            }
        }
        for members in sessions.values_mut() {
            members.sort_by_key(local_order);
        }
        Self {
            descendants,
            profile,
            options,
            by_guid,
            by_local,
            sessions,
        }
    }

    fn descendant(&self, guid: Guid) -> Option<&DescendantInfo> {
        self.by_guid.get(&guid).map(|&idx| &self.descendants[idx])
    }

    fn large_sessions(&self) -> impl Iterator<Item = &[Guid]> {
        self.sessions
            .values()
            .filter(|members| members.len() >= 3)
            .map(Vec::as_slice)
    }

    fn small_sessions(&self) -> impl Iterator<Item = &[Guid]> {
        self.sessions
            .values()
            .filter(|members| members.len() < 3)
            .map(Vec::as_slice)
    }

    /// Descendants admitted by `keep`, sorted by local id.
    fn sorted_pool(&self, keep: impl Fn(&DescendantInfo) -> bool) -> Vec<Guid> {
        let mut pool: Vec<Guid> = self
            .descendants
            .iter()
            .filter(|d| keep(d))
            .map(|d| d.guid)
            .collect();
        pool.sort_by_key(local_order);
        pool.dedup();
        pool
    }
}

fn local_order(guid: &Guid) -> (u32, u32) {
    (guid.local_id, guid.session_id)
}

// ============================================================================
// ENTRY POINT
// ============================================================================

/// Build the override → descendant mapping for one instance/symbol pair.
///
/// Deterministic for a given descendant order: override identifiers are
/// grouped and sorted before any phase looks at them, and every choice
/// has a total tie-break.
pub fn build_translation_map(
    descendants: &[DescendantInfo],
    derived_symbol_data: &[OverrideEntry],
    symbol_overrides: &[OverrideEntry],
    options: &ResolveOptions,
) -> GuidTranslationMap {
    if descendants.is_empty() {
        return GuidTranslationMap::new();
    }
    let profile = OverrideProfile::classify(derived_symbol_data, symbol_overrides);
    if profile.is_empty() {
        return GuidTranslationMap::new();
    }

    let ctx = TranslationContext::new(descendants, &profile, options);
    if ctx.sessions.is_empty() {
        // Every override id already names a descendant.
        return GuidTranslationMap::new();
    }

    let mut state = MatchState::default();
    for id in profile.ids() {
        if ctx.by_guid.contains_key(&id) {
            state.claim_identity(id);
        }
    }

    let (state, voted) = vote_offsets(&ctx, state);
    tracing::debug!(mapped = state.map.len(), "offset voting");
    let state = validate_sizes(&ctx, state, &voted);
    tracing::debug!(mapped = state.map.len(), "size validation");
    let state = sorted_fallback(&ctx, state);
    tracing::debug!(mapped = state.map.len(), "sorted fallback");
    let state = match_size_groups(&ctx, state);
    tracing::debug!(mapped = state.map.len(), "size groups");
    let state = match_small_sessions(&ctx, state);
    tracing::debug!(mapped = state.map.len(), "small sessions");
    let state = if options.sibling_swap {
        swap_hidden_siblings(&ctx, state)
    } else {
        state
    };

    GuidTranslationMap { map: state.map }
}

// ============================================================================
// PHASE 1: OFFSET VOTING
// ============================================================================

fn vote_offsets(
    ctx: &TranslationContext<'_>,
    mut state: MatchState,
) -> (MatchState, Vec<(Guid, Guid)>) {
    let mut voted = Vec::new();
    for members in ctx.large_sessions() {
        let Some(offset) = choose_offset(ctx, members) else {
            continue;
        };
        tracing::trace!(session = members[0].session_id, offset, "offset elected");
        for &member in members {
            if !state.override_free(member) {
                continue;
            }
            let Some(local) = member.local_minus(offset) else {
                continue;
            };
            let target = ctx
                .by_local
                .get(&local)
                .into_iter()
                .flatten()
                .map(|&idx| ctx.descendants[idx].guid)
                .find(|&guid| state.descendant_free(guid));
            if let Some(target) = target {
                if state.claim(member, target) {
                    voted.push((member, target));
                }
            }
        }
    }
    (state, voted)
}

/// The most frequent `override.local - descendant.local` over all pairs.
///
/// Ties go to the offset under which most members land on a node their
/// type hint agrees with, then to the smallest absolute offset, then to
/// the smallest offset.
fn choose_offset(ctx: &TranslationContext<'_>, members: &[Guid]) -> Option<i64> {
    let mut tally: FxHashMap<i64, usize> = FxHashMap::default();
    for member in members {
        for d in ctx.descendants {
            let offset = i64::from(member.local_id) - i64::from(d.guid.local_id);
            *tally.entry(offset).or_default() += 1;
        }
    }
    let best = tally.values().copied().max()?;
    let mut tied: Vec<i64> = tally
        .into_iter()
        .filter(|&(_, count)| count == best)
        .map(|(offset, _)| offset)
        .collect();
    if tied.len() == 1 {
        return tied.pop();
    }
    tied.sort_by_key(|&offset| {
        (
            std::cmp::Reverse(hint_agreement(ctx, members, offset)),
            offset.unsigned_abs(),
            offset,
        )
    });
    tied.first().copied()
}

fn hint_agreement(ctx: &TranslationContext<'_>, members: &[Guid], offset: i64) -> usize {
    members
        .iter()
        .filter(|member| {
            let hint = ctx.profile.hint(**member);
            member
                .local_minus(offset)
                .and_then(|local| ctx.by_local.get(&local))
                .is_some_and(|idxs| {
                    idxs.iter()
                        .any(|&idx| hint.agrees_with(ctx.descendants[idx].kind))
                })
        })
        .count()
}

// ============================================================================
// PHASE 1 VALIDATION: SIZE GUARD
// ============================================================================

fn validate_sizes(
    ctx: &TranslationContext<'_>,
    mut state: MatchState,
    voted: &[(Guid, Guid)],
) -> MatchState {
    for &(from, to) in voted {
        let Some(expected) = ctx.profile.size(from) else {
            continue;
        };
        let Some(actual) = ctx.descendant(to).map(|d| d.size) else {
            continue;
        };
        if !sizes_consistent(expected, actual, ctx.options.size_ratio_limit) {
            tracing::trace!(%from, %to, "vote dropped by size guard");
            state.release(from);
        }
    }
    state
}

/// Whether two sizes are within `limit` of each other in both dimensions.
///
/// Dimensions where both values are at most 1 are not compared, and the
/// smaller value is clamped to 1 so degenerate (line-like) nodes do not
/// divide by zero.
pub fn sizes_consistent(a: Size, b: Size, limit: f64) -> bool {
    let within = |x: f64, y: f64| {
        let (hi, lo) = (x.max(y), x.min(y));
        hi <= 1.0 || hi / lo.max(1.0) <= limit
    };
    within(a.width, b.width) && within(a.height, b.height)
}

// ============================================================================
// PHASE 1.5: SORTED FALLBACK IN LARGE SESSIONS
// ============================================================================

fn sorted_fallback(ctx: &TranslationContext<'_>, mut state: MatchState) -> MatchState {
    let sessions: Vec<&[Guid]> = ctx.large_sessions().collect();
    for members in sessions {
        for hint in [TypeHint::Text, TypeHint::Instance] {
            let subset: Vec<Guid> = members
                .iter()
                .copied()
                .filter(|&m| state.override_free(m) && ctx.profile.hint(m) == hint)
                .collect();
            if subset.is_empty() {
                continue;
            }
            let pool =
                ctx.sorted_pool(|d| hint.agrees_with(d.kind) && state.descendant_free(d.guid));
            for (from, to) in subset.into_iter().zip(pool) {
                state.claim(from, to);
            }
        }
    }
    state
}

// ============================================================================
// PHASE 1.75: SIZE GROUPS
// ============================================================================

fn size_key(size: Size) -> (i64, i64) {
    (size.width.round() as i64, size.height.round() as i64)
}

fn match_size_groups(ctx: &TranslationContext<'_>, mut state: MatchState) -> MatchState {
    let mut groups: BTreeMap<(i64, i64), Vec<Guid>> = BTreeMap::new();
    for members in ctx.sessions.values() {
        for &member in members {
            if !state.override_free(member) {
                continue;
            }
            if let Some(size) = ctx.profile.size(member) {
                groups.entry(size_key(size)).or_default().push(member);
            }
        }
    }
    for (key, mut group) in groups {
        group.sort_by_key(local_order);
        let pool = ctx.sorted_pool(|d| size_key(d.size) == key && state.descendant_free(d.guid));
        for (from, to) in group.into_iter().zip(pool) {
            state.claim(from, to);
        }
    }
    state
}

// ============================================================================
// PHASE 2: SMALL SESSIONS
// ============================================================================

fn match_small_sessions(ctx: &TranslationContext<'_>, mut state: MatchState) -> MatchState {
    let sessions: Vec<&[Guid]> = ctx.small_sessions().collect();
    for members in sessions {
        let mut by_hint: BTreeMap<TypeHint, Vec<Guid>> = BTreeMap::new();
        for &member in members {
            if state.override_free(member) {
                by_hint.entry(ctx.profile.hint(member)).or_default().push(member);
            }
        }
        for (hint, group) in by_hint {
            let pool = ctx.sorted_pool(|d| hint.admits(d.kind));
            let free: Vec<Guid> = pool
                .iter()
                .copied()
                .filter(|&guid| state.descendant_free(guid))
                .collect();
            let candidates = if free.len() >= group.len() { free } else { pool };
            for (from, to) in group.into_iter().zip(candidates) {
                // Claimed slots of the full pool stay with their owner.
                state.claim(from, to);
            }
        }
    }
    state
}

// ============================================================================
// PHASE 3: SIBLING SWAP
// ============================================================================

fn swap_hidden_siblings(ctx: &TranslationContext<'_>, mut state: MatchState) -> MatchState {
    let pairs: Vec<(Guid, Guid)> = state.map.iter().map(|(&f, &t)| (f, t)).collect();
    let mut touched: FxHashSet<Guid> = FxHashSet::default();
    for (from, _) in pairs {
        if touched.contains(&from) || !ctx.profile.swaps_symbol(from) {
            continue;
        }
        let Some(to) = state.map.get(&from).copied() else {
            continue;
        };
        let Some(current) = ctx.descendant(to) else {
            continue;
        };
        if current.visible {
            continue;
        }
        let sibling = [-1i64, 1]
            .into_iter()
            .filter_map(|step| current.guid.local_minus(step))
            .map(|local| Guid::new(current.guid.session_id, local))
            .filter_map(|guid| ctx.descendant(guid))
            .find(|d| d.kind == current.kind && d.visible);
        let Some(sibling) = sibling else {
            continue;
        };

        let holder = state
            .map
            .iter()
            .find(|&(_, &target)| target == sibling.guid)
            .map(|(&holder, _)| holder);
        match holder {
            Some(holder) => {
                state.map.insert(from, sibling.guid);
                state.map.insert(holder, to);
                touched.insert(holder);
            }
            None if state.descendant_free(sibling.guid) => {
                state.claimed_descendants.remove(&to);
                state.claimed_descendants.insert(sibling.guid);
                state.map.insert(from, sibling.guid);
            }
            // Claimed as an identity match; leave it alone.
            None => continue,
        }
        tracing::trace!(%from, hidden = %to, visible = %sibling.guid, "sibling swap");
        touched.insert(from);
    }
    state
}
