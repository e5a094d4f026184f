#![forbid(unsafe_code)]

//! Browser input types consumed by the navigation bridge.
//!
//! # Design Notes
//!
//! - `ClickEvent` is generic over the node type so the same value can carry a
//!   `web_sys::Element` in the browser and an in-memory node in tests.
//! - `Modifiers` use bitflags for easy combination.
//! - Alt is tracked but does not count as an "open elsewhere" intent.

use bitflags::bitflags;

bitflags! {
    /// Modifier keys held during a pointer click.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Meta/Command/Windows key.
        const META  = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

impl Modifiers {
    /// Build from the four boolean flags a DOM `MouseEvent` exposes.
    #[must_use]
    pub fn from_flags(shift: bool, alt: bool, ctrl: bool, meta: bool) -> Self {
        let mut mods = Self::NONE;
        mods.set(Self::SHIFT, shift);
        mods.set(Self::ALT, alt);
        mods.set(Self::CTRL, ctrl);
        mods.set(Self::META, meta);
        mods
    }

    /// True when the click asks for a new tab or window (shift, ctrl, or meta).
    #[must_use]
    pub const fn opens_elsewhere(self) -> bool {
        self.intersects(Self::SHIFT.union(Self::CTRL).union(Self::META))
    }
}

/// A pointer click as seen by the navigation bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent<N> {
    /// Element the click landed on, if the platform reported one.
    pub target: Option<N>,
    /// Modifier keys held during the click.
    pub modifiers: Modifiers,
}

impl<N> ClickEvent<N> {
    /// A plain click on `target` with no modifiers.
    #[must_use]
    pub const fn new(target: Option<N>) -> Self {
        Self {
            target,
            modifiers: Modifiers::NONE,
        }
    }

    /// Set the held modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}
