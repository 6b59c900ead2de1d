//! Gated-content unlock.
//!
//! Each rendered gated block gets its own [`GatedBlock`], which starts
//! [`GateState::Locked`] and can only move to [`GateState::Unlocked`]. The
//! state lives for one render session; a reload starts locked again.
//!
//! The passphrase is compared in plaintext with exact equality. There is no
//! attempt counter or lockout: this hides a link from casual visitors, it is
//! not an access-control boundary.

use std::fmt;

use serde::Serialize;

use crate::block::{Block, BlockKind};
use crate::render::{Icon, RenderPlan, unlocked_link_plan};

/// Lock state of a gated block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Only the passphrase prompt is shown
    Locked,
    /// The link is revealed
    Unlocked,
}

/// Result of submitting a passphrase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// Correct passphrase; the block is now unlocked
    Unlocked,
    /// Wrong passphrase; input cleared and shake raised
    Rejected,
    /// The block was already unlocked; nothing changed
    AlreadyUnlocked,
}

/// Per-instance unlock machine for a `gated_link` block.
pub struct GatedBlock {
    block: Block,
    state: GateState,
    input: String,
    shake: bool,
}

impl GatedBlock {
    /// Wrap a gated block. Returns `None` for any other block type.
    pub fn from_block(block: &Block) -> Option<Self> {
        if !matches!(block.kind, BlockKind::GatedLink { .. }) {
            return None;
        }

        Some(Self {
            block: block.clone(),
            state: GateState::Locked,
            input: String::new(),
            shake: false,
        })
    }

    /// Id of the wrapped block
    pub fn block_id(&self) -> &str {
        &self.block.id
    }

    /// Current lock state
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Whether the link has been revealed
    pub fn is_unlocked(&self) -> bool {
        self.state == GateState::Unlocked
    }

    /// Current passphrase input
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the passphrase input (one call per keystroke is fine)
    pub fn set_input(&mut self, value: impl Into<String>) {
        self.input = value.into();
    }

    /// Whether the error animation should play
    pub fn is_shaking(&self) -> bool {
        self.shake
    }

    /// Clear the error animation flag once it has played
    pub fn acknowledge_shake(&mut self) {
        self.shake = false;
    }

    /// Compare the current input to the secret.
    pub fn submit(&mut self) -> UnlockOutcome {
        if self.is_unlocked() {
            return UnlockOutcome::AlreadyUnlocked;
        }

        let matches = self
            .block
            .kind
            .secret()
            .is_some_and(|secret| secret == self.input);

        if matches {
            log::debug!("Gated block {} unlocked", self.block.id);
            self.state = GateState::Unlocked;
            self.shake = false;
            UnlockOutcome::Unlocked
        } else {
            self.input.clear();
            self.shake = true;
            UnlockOutcome::Rejected
        }
    }

    /// Set the input and submit it in one step
    pub fn try_passphrase(&mut self, attempt: &str) -> UnlockOutcome {
        self.set_input(attempt);
        self.submit()
    }

    /// What to draw right now.
    ///
    /// Locked blocks only ever yield [`RenderPlan::Gated`]. Unlocked blocks
    /// yield the link plan with the open-padlock icon, or `None` for a draft
    /// without a target.
    pub fn plan(&self) -> Option<RenderPlan> {
        match self.state {
            GateState::Locked => Some(RenderPlan::Gated {
                label: self.block.title.clone(),
                icon: Icon::Locked,
            }),
            GateState::Unlocked => unlocked_link_plan(&self.block),
        }
    }
}

impl fmt::Debug for GatedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the secret or the hidden target
        f.debug_struct("GatedBlock")
            .field("block_id", &self.block.id)
            .field("state", &self.state)
            .field("shake", &self.shake)
            .finish_non_exhaustive()
    }
}

/// One-shot check for a stateless request: the revealed link plan on a
/// correct passphrase, `None` otherwise (including non-gated blocks and
/// gated blocks without a followable target).
pub fn unlock_once(block: &Block, attempt: &str) -> Option<RenderPlan> {
    let mut gate = GatedBlock::from_block(block)?;
    match gate.try_passphrase(attempt) {
        UnlockOutcome::Unlocked => gate.plan(),
        UnlockOutcome::Rejected | UnlockOutcome::AlreadyUnlocked => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockStyle;

    fn gated(secret: &str) -> Block {
        Block {
            id: "g1".into(),
            owner_id: "owner".into(),
            title: "Backstage".into(),
            kind: BlockKind::GatedLink {
                target: "https://example.com/backstage".into(),
                secret: secret.into(),
            },
            position: 0,
            style: BlockStyle::Primary,
            icon: None,
            interaction_count: 0,
        }
    }

    #[test]
    fn test_non_gated_blocks_are_not_wrapped() {
        let mut block = gated("open");
        block.kind = BlockKind::Header;
        assert!(GatedBlock::from_block(&block).is_none());
    }

    #[test]
    fn test_wrong_then_right_passphrase() {
        let mut gate = GatedBlock::from_block(&gated("open")).unwrap();

        gate.set_input("wrong");
        assert_eq!(gate.submit(), UnlockOutcome::Rejected);
        assert_eq!(gate.state(), GateState::Locked);
        assert_eq!(gate.input(), "");
        assert!(gate.is_shaking());
        assert!(matches!(gate.plan(), Some(RenderPlan::Gated { .. })));

        gate.acknowledge_shake();
        assert!(!gate.is_shaking());

        assert_eq!(gate.try_passphrase("open"), UnlockOutcome::Unlocked);
        assert!(gate.is_unlocked());
        assert_eq!(
            gate.plan(),
            Some(RenderPlan::Link {
                label: "Backstage".into(),
                href: "https://example.com/backstage".into(),
                icon: Icon::Unlocked,
                style: BlockStyle::Primary,
            })
        );

        // Unlocked is terminal for the session
        assert_eq!(gate.try_passphrase("wrong"), UnlockOutcome::AlreadyUnlocked);
        assert!(gate.is_unlocked());
    }

    #[test]
    fn test_comparison_is_exact() {
        let mut gate = GatedBlock::from_block(&gated("Open")).unwrap();
        assert_eq!(gate.try_passphrase("open"), UnlockOutcome::Rejected);
        assert_eq!(gate.try_passphrase("Open "), UnlockOutcome::Rejected);
        assert_eq!(gate.try_passphrase("Open"), UnlockOutcome::Unlocked);
    }

    #[test]
    fn test_locked_plan_never_leaks_target() {
        let gate = GatedBlock::from_block(&gated("open")).unwrap();
        let json = serde_json::to_string(&gate.plan()).unwrap();
        assert!(!json.contains("backstage"));
        assert!(!format!("{gate:?}").contains("open"));
    }

    #[test]
    fn test_new_instance_starts_locked() {
        let block = gated("open");
        let mut first = GatedBlock::from_block(&block).unwrap();
        first.try_passphrase("open");
        let second = GatedBlock::from_block(&block).unwrap();
        assert_eq!(second.state(), GateState::Locked);
    }

    #[test]
    fn test_unlock_once() {
        let block = gated("open");
        assert!(unlock_once(&block, "nope").is_none());
        assert!(matches!(
            unlock_once(&block, "open"),
            Some(RenderPlan::Link { .. })
        ));
    }
}
