//! Persistent per-stage binding slots.
//!
//! Every stage of every draw in a frame takes the next slot in order. Plans
//! keep the same shape from frame to frame, so slot `n` usually sees the same
//! program and resources again: its uniform buffer is rewritten in place and
//! its bind group reused. Buffers are only created when a slot is new or its
//! program changed; bind groups only when the bound resources changed.

use super::shader::ProgramId;
use super::{SamplerRef, TextureRef};

/// What a slot's bind group was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StageSignature {
    pub program: ProgramId,
    pub textures: Vec<(u32, TextureRef)>,
    pub samplers: Vec<(u32, SamplerRef)>,
    /// Bumped whenever a renderer-owned view (post targets, shadow map, sky)
    /// is recreated.
    pub generation: u64,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum SlotUpdate {
    /// Same program and views: only the uniform bytes are written.
    Write,
    /// Same program, different views: new bind group over the old buffer.
    Rebind,
    /// New slot or different program: new buffer and bind group.
    Rebuild,
}

pub(crate) fn slot_update(current: Option<&StageSignature>, wanted: &StageSignature) -> SlotUpdate {
    match current {
        None => SlotUpdate::Rebuild,
        Some(cur) if cur.program != wanted.program => SlotUpdate::Rebuild,
        Some(cur) if cur == wanted => SlotUpdate::Write,
        Some(_) => SlotUpdate::Rebind,
    }
}

pub(crate) struct StageSlot {
    pub signature: StageSignature,
    /// `None` for programs without parameters.
    pub uniform: Option<wgpu::Buffer>,
    pub group: wgpu::BindGroup,
}

/// Hands out slots in draw order; reset once per frame.
#[derive(Default)]
pub(crate) struct SlotCursor {
    next: usize,
}

impl SlotCursor {
    pub fn take(&mut self) -> usize {
        let n = self.next;
        self.next += 1;
        n
    }

    /// Slots handed out since the last reset.
    pub fn in_use(&self) -> usize {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}
