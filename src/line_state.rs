//! Per-line cache state.
//!
//! A [`LineState`] is the unit of storage in a [`crate::cache::Cache`]'s tag
//! array: a tag, a coherency [`Status`], per-object valid/dirty bit vectors,
//! an opaque owner id, and an opaque caller-chosen payload (`info`).

use std::fmt;
use std::str::FromStr;

use crate::error::CheckpointError;

/// Sentinel tag written by [`LineState::clear`]. Chosen to match the value
/// the modeling framework this substrate descends from uses, so that a
/// cache's `Original()` address helper can recognize a cleared line without
/// a separate "has this line ever been touched" bit.
pub const SENTINEL_TAG: u64 = 0xdead_beef;

/// Coherency status of a cache line.
///
/// This enumeration is closed: the text checkpoint format in
/// [`crate::cache::Cache::save_cache_state`] emits and parses these variant
/// names verbatim, so adding a variant is a format change, not just a code
/// change. The `serde` renames match [`Status::name`] exactly, so a
/// `CacheConfig`'s `initial_warmed_status` field accepts the same spelling a
/// checkpoint file would.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Status {
    /// No valid data; tag and bit vectors are unspecified.
    #[serde(rename = "INVALID")]
    Invalid,
    /// Present, consistent with other copies in the system.
    #[serde(rename = "SHARED")]
    Shared,
    /// Present, the only copy, and clean (matches backing storage).
    #[serde(rename = "EXCLUSIVE_CLEAN")]
    ExclusiveClean,
    /// Present, the only copy, and modified relative to backing storage.
    #[serde(rename = "EXCLUSIVE_DIRTY")]
    ExclusiveDirty,
    /// Pinned by an in-flight fill; must never be chosen as a victim.
    #[serde(rename = "RESERVED")]
    Reserved,
    /// Eligible to be synthesized as already-populated during warm-up.
    #[serde(rename = "WARM")]
    Warm,
    /// Absorbing status: once set, further `set_status` calls are ignored.
    #[serde(rename = "PERFECT")]
    Perfect,
}

impl Status {
    /// The name used in the text checkpoint format, verbatim.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invalid => "INVALID",
            Self::Shared => "SHARED",
            Self::ExclusiveClean => "EXCLUSIVE_CLEAN",
            Self::ExclusiveDirty => "EXCLUSIVE_DIRTY",
            Self::Reserved => "RESERVED",
            Self::Warm => "WARM",
            Self::Perfect => "PERFECT",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Status {
    type Err = CheckpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVALID" => Ok(Self::Invalid),
            "SHARED" => Ok(Self::Shared),
            "EXCLUSIVE_CLEAN" => Ok(Self::ExclusiveClean),
            "EXCLUSIVE_DIRTY" => Ok(Self::ExclusiveDirty),
            "RESERVED" => Ok(Self::Reserved),
            "WARM" => Ok(Self::Warm),
            "PERFECT" => Ok(Self::Perfect),
            other => Err(CheckpointError::UnknownStatus(other.to_owned())),
        }
    }
}

/// One `(set, way)` cell of a cache's tag array.
///
/// `I` is the caller-chosen opaque per-line payload type; it defaults to
/// `()` for callers that only need tag/status bookkeeping.
#[derive(Clone, Debug)]
pub struct LineState<I = ()> {
    tag: u64,
    way: u8,
    status: Status,
    valid: Vec<bool>,
    dirty: Vec<bool>,
    owner_id: u32,
    info: I,
}

impl<I: Default> LineState<I> {
    /// Builds a freshly-cleared line for column `way`, with `num_objects`
    /// valid/dirty bits.
    ///
    /// `way` is fixed for the lifetime of the line: it is set once here,
    /// from the tag array's column index, and `clear()` never resets it.
    #[must_use]
    pub fn new(way: u8, num_objects: usize) -> Self {
        Self {
            tag: SENTINEL_TAG,
            way,
            status: Status::Invalid,
            valid: vec![false; num_objects],
            dirty: vec![false; num_objects],
            owner_id: u32::MAX,
            info: I::default(),
        }
    }
}

impl<I> LineState<I> {
    /// The line's tag.
    #[must_use]
    pub const fn tag(&self) -> u64 {
        self.tag
    }

    /// Sets the line's tag. The cache applies no masking; the caller chooses
    /// the tag.
    pub fn set_tag(&mut self, tag: u64) {
        self.tag = tag;
    }

    /// The line's fixed column index.
    #[must_use]
    pub const fn way(&self) -> u8 {
        self.way
    }

    /// The line's current coherency status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Assigns a new status, unless the line is currently [`Status::Perfect`]
    /// — `PERFECT` is a sticky absorbing state and every write path to
    /// `status` must go through this guard.
    pub fn set_status(&mut self, new: Status) {
        if self.status != Status::Perfect {
            self.status = new;
        }
    }

    /// Directly assigns status without the `PERFECT` guard. Reserved for
    /// restore paths that are reconstructing a previously-saved state rather
    /// than modeling a coherency transition.
    pub(crate) fn force_status(&mut self, new: Status) {
        self.status = new;
    }

    /// Number of valid/dirty sub-objects this line carries.
    #[must_use]
    pub fn num_objects(&self) -> usize {
        self.valid.len()
    }

    /// Reads the valid bit for sub-object `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_objects()`.
    #[must_use]
    pub fn valid_bit(&self, i: usize) -> bool {
        self.valid[i]
    }

    /// Sets the valid bit for sub-object `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_objects()`.
    pub fn set_valid_bit(&mut self, i: usize) {
        self.valid[i] = true;
    }

    /// Clears the valid bit for sub-object `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_objects()`.
    pub fn clear_valid_bit(&mut self, i: usize) {
        self.valid[i] = false;
    }

    /// Reads the dirty bit for sub-object `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_objects()`.
    #[must_use]
    pub fn dirty_bit(&self, i: usize) -> bool {
        self.dirty[i]
    }

    /// Sets the dirty bit for sub-object `i`.
    ///
    /// Dirty bits are only meaningful when `status == EXCLUSIVE_DIRTY`; the
    /// cache body is responsible for keeping that coupling true, this setter
    /// does not enforce it itself (mirroring the source's separation of line
    /// bookkeeping from cache-level policy).
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_objects()`.
    pub fn set_dirty_bit(&mut self, i: usize) {
        self.dirty[i] = true;
    }

    /// Clears the dirty bit for sub-object `i`.
    ///
    /// When the `legacy-clear-dirty-bit` feature is enabled, this instead
    /// reproduces the pre-audit behavior of clearing the *valid* bit — kept
    /// only so existing callers can migrate on their own schedule; new code
    /// should not depend on it.
    ///
    /// # Panics
    ///
    /// Panics if `i >= num_objects()`.
    pub fn clear_dirty_bit(&mut self, i: usize) {
        #[cfg(feature = "legacy-clear-dirty-bit")]
        {
            self.valid[i] = false;
        }
        #[cfg(not(feature = "legacy-clear-dirty-bit"))]
        {
            self.dirty[i] = false;
        }
    }

    /// The opaque owner id (caller-defined, e.g. the requesting agent).
    #[must_use]
    pub const fn owner_id(&self) -> u32 {
        self.owner_id
    }

    /// Sets the opaque owner id.
    pub fn set_owner_id(&mut self, owner_id: u32) {
        self.owner_id = owner_id;
    }

    /// Borrows the opaque per-line payload.
    #[must_use]
    pub const fn info(&self) -> &I {
        &self.info
    }

    /// Mutably borrows the opaque per-line payload.
    pub fn info_mut(&mut self) -> &mut I {
        &mut self.info
    }

    /// Overwrites the opaque per-line payload.
    pub fn set_info(&mut self, info: I) {
        self.info = info;
    }

    /// Resets tag, status, and valid/dirty bits to their post-construction
    /// values. `way` and `info` are untouched — `way` is fixed for the
    /// line's lifetime, and `info` is the caller's payload to manage.
    pub fn clear(&mut self) {
        self.tag = SENTINEL_TAG;
        self.status = Status::Invalid;
        self.owner_id = u32::MAX;
        for bit in &mut self.valid {
            *bit = false;
        }
        for bit in &mut self.dirty {
            *bit = false;
        }
    }

    /// Writes this line's checkpoint record to `writer` and returns `true`,
    /// unless the line is `INVALID`, in which case nothing is written and
    /// this returns `false`.
    ///
    /// Format: `S: <idx> W: <way> tag=0x<hex> status=<name> valid=0b<bits>
    /// dirty=0b<bits> ownerId=<n>`.
    pub fn save_tag_array_state(
        &self,
        index: usize,
        writer: &mut impl fmt::Write,
    ) -> Result<bool, fmt::Error> {
        if self.status == Status::Invalid {
            return Ok(false);
        }
        write!(
            writer,
            "S: {} W: {} tag=0x{:x} status={} valid=0b{} dirty=0b{} ownerId={}",
            index,
            self.way,
            self.tag,
            self.status,
            bits_to_string(&self.valid),
            bits_to_string(&self.dirty),
            self.owner_id
        )?;
        Ok(true)
    }
}

fn bits_to_string(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}
