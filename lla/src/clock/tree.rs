// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

use crate::clock::{ClockFlags, ClockId, ClockNode};
use crate::config::CONFIG;
use crate::debug;
use crate::hil;
use crate::ErrorCode;

/// Arena of clock nodes and the operations shared by every bank.
pub struct ClockTree<'a> {
    nodes: &'a [ClockNode<'a>],
}

impl<'a> ClockTree<'a> {
    /// Adopt a node table.
    ///
    /// Every node's id must equal its index, every parent link must name a
    /// node of the table, and following parent links must never loop.
    pub fn new(nodes: &'a [ClockNode<'a>]) -> Result<Self, ErrorCode> {
        if nodes.len() > usize::from(u16::MAX) {
            return Err(ErrorCode::SIZE);
        }
        let tree = ClockTree { nodes };
        for (index, node) in nodes.iter().enumerate() {
            if node.id().index() != index {
                return Err(ErrorCode::INVAL);
            }
            if let Some(parent) = node.parent() {
                tree.node(parent)?;
            }
        }
        for node in nodes {
            if tree.depth(node.id()).is_none() {
                return Err(ErrorCode::INVAL);
            }
        }
        Ok(tree)
    }

    pub fn nodes(&self) -> &'a [ClockNode<'a>] {
        self.nodes
    }

    pub fn node(&self, id: ClockId) -> Result<&'a ClockNode<'a>, ErrorCode> {
        self.nodes.get(id.index()).ok_or(ErrorCode::INVAL)
    }

    pub fn lookup(&self, name: &str) -> Option<ClockId> {
        self.nodes
            .iter()
            .find(|node| node.name() == name)
            .map(ClockNode::id)
    }

    pub fn rate(&self, id: ClockId) -> Result<u32, ErrorCode> {
        self.node(id).map(ClockNode::rate)
    }

    pub fn parent(&self, id: ClockId) -> Result<Option<ClockId>, ErrorCode> {
        self.node(id).map(ClockNode::parent)
    }

    /// Nodes whose current parent is `id`, in table order.
    pub fn children(&self, id: ClockId) -> impl Iterator<Item = &'a ClockNode<'a>> {
        self.nodes
            .iter()
            .filter(move |node| node.parent() == Some(id))
    }

    /// Cached rate of the current parent of `node`, `0` without a parent.
    pub fn parent_rate(&self, node: &ClockNode<'_>) -> u32 {
        node.parent()
            .and_then(|parent| self.nodes.get(parent.index()))
            .map_or(0, ClockNode::rate)
    }

    /// A consumer handle on `id`.
    pub fn handle(&'a self, id: ClockId) -> Result<ClockHandle<'a>, ErrorCode> {
        self.node(id)?;
        Ok(ClockHandle { tree: self, id })
    }

    /// Number of parent links between `id` and its root, or `None` if the
    /// links loop.
    fn depth(&self, id: ClockId) -> Option<usize> {
        let mut current = self.nodes.get(id.index())?.parent();
        let mut depth = 0;
        while let Some(parent) = current {
            depth += 1;
            if depth > self.nodes.len() {
                return None;
            }
            current = self.nodes.get(parent.index())?.parent();
        }
        Some(depth)
    }

    /// Whether making `parent` the parent of `id` would close a loop.
    fn creates_cycle(&self, id: ClockId, parent: ClockId) -> bool {
        let mut current = Some(parent);
        let mut steps = 0;
        while let Some(ancestor) = current {
            if ancestor == id || steps > self.nodes.len() {
                return true;
            }
            steps += 1;
            current = self.nodes.get(ancestor.index()).and_then(ClockNode::parent);
        }
        false
    }

    /// Bring `id` up: bank validation, parent identification from hardware,
    /// rate computation.
    ///
    /// Parents should be initialized before their children.
    pub fn init(&self, id: ClockId) -> Result<(), ErrorCode> {
        let node = self.node(id)?;
        node.ops().init(self, node)?;
        let parent = node.ops().identify_parent(self, node);
        if let Some(parent) = parent {
            self.node(parent)?;
            if self.creates_cycle(id, parent) {
                return Err(ErrorCode::INVAL);
            }
        }
        node.set_parent_link(parent);
        node.mark_initialized();
        let rate = self.store_rate(node);
        if CONFIG.trace_clock_ops {
            debug!("clk {}: init, parent {:?}, {} Hz", node.name(), parent, rate);
        }
        Ok(())
    }

    /// Recompute and cache the rate of `id`. Idempotent.
    pub fn recalc(&self, id: ClockId) -> Result<u32, ErrorCode> {
        let node = self.node(id)?;
        Ok(self.store_rate(node))
    }

    /// Program `id` as close as possible to `hz`.
    ///
    /// The cached rate is only updated if the bank succeeded; children of a
    /// propagating node are recalculated afterwards.
    pub fn set_rate(&self, id: ClockId, hz: u32) -> Result<(), ErrorCode> {
        let node = self.node(id)?;
        if hz == 0 {
            return Err(ErrorCode::INVAL);
        }
        if !node.is_root() {
            match node.parent() {
                None => return Err(ErrorCode::FAIL),
                Some(_) if self.parent_rate(node) == 0 => return Err(ErrorCode::FAIL),
                Some(_) => {}
            }
        }
        if let Err(err) = node.ops().set_rate(self, node, hz) {
            debug!("clk {}: set_rate({}) failed: {:?}", node.name(), hz, err);
            return Err(err);
        }
        let rate = self.store_rate(node);
        self.propagate(node);
        if CONFIG.trace_clock_ops {
            debug!("clk {}: set_rate({}) -> {} Hz", node.name(), hz, rate);
        }
        Ok(())
    }

    /// Switch `id` to `parent`.
    pub fn set_parent(&self, id: ClockId, parent: ClockId) -> Result<(), ErrorCode> {
        let node = self.node(id)?;
        self.node(parent)?;
        if self.creates_cycle(id, parent) {
            return Err(ErrorCode::INVAL);
        }
        node.ops().set_parent(self, node, parent)?;
        node.set_parent_link(Some(parent));
        let rate = self.store_rate(node);
        self.propagate(node);
        if CONFIG.trace_clock_ops {
            debug!("clk {}: set_parent({}) -> {} Hz", node.name(), parent, rate);
        }
        Ok(())
    }

    pub fn enable(&self, id: ClockId) -> Result<(), ErrorCode> {
        let node = self.node(id)?;
        node.ops().enable(self, node)?;
        let rate = self.store_rate(node);
        self.propagate(node);
        if CONFIG.trace_clock_ops {
            debug!("clk {}: enable -> {} Hz", node.name(), rate);
        }
        Ok(())
    }

    /// Gate `id`. Always-enabled nodes stay running and report success.
    pub fn disable(&self, id: ClockId) -> Result<(), ErrorCode> {
        let node = self.node(id)?;
        if node.flags().contains(ClockFlags::ALWAYS_ENABLED) {
            debug!("clk {}: always enabled, disable ignored", node.name());
            return Ok(());
        }
        node.ops().disable(self, node)?;
        self.store_rate(node);
        self.propagate(node);
        if CONFIG.trace_clock_ops {
            debug!("clk {}: disabled", node.name());
        }
        Ok(())
    }

    /// Route `id` to its bank's observation output.
    pub fn observe(&self, id: ClockId) -> Result<(), ErrorCode> {
        let node = self.node(id)?;
        node.ops().observe(self, node)
    }

    fn store_rate(&self, node: &ClockNode<'_>) -> u32 {
        let rate = node.ops().recalc(self, node);
        node.set_cached_rate(rate);
        rate
    }

    fn propagate(&self, node: &ClockNode<'_>) {
        if !node.flags().contains(ClockFlags::RATE_PROPAGATES) {
            return;
        }
        for child in self.children(node.id()) {
            self.store_rate(child);
            self.propagate(child);
        }
    }
}

/// A consumer's view of one clock.
#[derive(Clone, Copy)]
pub struct ClockHandle<'a> {
    tree: &'a ClockTree<'a>,
    id: ClockId,
}

impl ClockHandle<'_> {
    pub fn id(&self) -> ClockId {
        self.id
    }
}

impl hil::clock::Clock for ClockHandle<'_> {
    fn name(&self) -> &'static str {
        self.tree.node(self.id).map_or("", ClockNode::name)
    }

    fn rate(&self) -> u32 {
        self.tree.rate(self.id).unwrap_or(0)
    }

    fn recalc(&self) -> Result<u32, ErrorCode> {
        self.tree.recalc(self.id)
    }

    fn set_rate(&self, hz: u32) -> Result<u32, ErrorCode> {
        self.tree.set_rate(self.id, hz)?;
        self.tree.rate(self.id)
    }

    fn enable(&self) -> Result<(), ErrorCode> {
        self.tree.enable(self.id)
    }

    fn disable(&self) -> Result<(), ErrorCode> {
        self.tree.disable(self.id)
    }

    fn is_enabled(&self) -> bool {
        self.tree.rate(self.id).is_ok_and(|rate| rate != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::ClockTree;
    use crate::clock::{ClockFlags, ClockId, ClockNode, ClockOps, ClockState};
    use crate::hil::clock::Clock;
    use crate::ErrorCode;
    use core::cell::Cell;

    /// Oscillators: rate is the nominal rate, nothing can change it.
    struct Osc;

    impl ClockOps for Osc {
        fn init(&self, _tree: &ClockTree<'_>, _node: &ClockNode<'_>) -> Result<(), ErrorCode> {
            Ok(())
        }

        fn recalc(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> u32 {
            node.nominal_rate()
        }
    }

    /// A bank of four gateable integer dividers (ids 2..=5) fed by either
    /// oscillator.
    struct Dividers {
        div: [Cell<u32>; 4],
        gated: [Cell<bool>; 4],
    }

    impl Dividers {
        fn new() -> Self {
            Dividers {
                div: core::array::from_fn(|_| Cell::new(1)),
                gated: core::array::from_fn(|_| Cell::new(false)),
            }
        }

        fn slot(&self, node: &ClockNode<'_>) -> Result<usize, ErrorCode> {
            match node.id().0 {
                2..=5 => Ok(usize::from(node.id().0 - 2)),
                _ => Err(ErrorCode::INVAL),
            }
        }
    }

    impl ClockOps for Dividers {
        fn init(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
            self.slot(node).map(|_| ())
        }

        fn recalc(&self, tree: &ClockTree<'_>, node: &ClockNode<'_>) -> u32 {
            match self.slot(node) {
                Ok(slot) if !self.gated[slot].get() => {
                    tree.parent_rate(node) / self.div[slot].get()
                }
                _ => 0,
            }
        }

        fn set_rate(
            &self,
            tree: &ClockTree<'_>,
            node: &ClockNode<'_>,
            hz: u32,
        ) -> Result<(), ErrorCode> {
            let slot = self.slot(node)?;
            let div = (tree.parent_rate(node) / hz).clamp(1, 16);
            self.div[slot].set(div);
            Ok(())
        }

        fn set_parent(
            &self,
            _tree: &ClockTree<'_>,
            node: &ClockNode<'_>,
            parent: ClockId,
        ) -> Result<(), ErrorCode> {
            self.slot(node)?;
            match parent.0 {
                0 | 1 | 2 => Ok(()),
                _ => Err(ErrorCode::INVAL),
            }
        }

        fn enable(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
            self.gated[self.slot(node)?].set(false);
            Ok(())
        }

        fn disable(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
            self.gated[self.slot(node)?].set(true);
            Ok(())
        }
    }

    fn table<'a>(osc: &'a Osc, div: &'a Dividers) -> [ClockNode<'a>; 6] {
        [
            ClockNode::new(ClockId(0), "osc_30", osc).with_nominal(30_000_000),
            ClockNode::new(ClockId(1), "osc_27", osc).with_nominal(27_000_000),
            ClockNode::new(ClockId(2), "div_a", div)
                .with_parent(ClockId(0))
                .with_flags(ClockFlags::RATE_PROPAGATES),
            ClockNode::new(ClockId(3), "div_b", div).with_parent(ClockId(2)),
            ClockNode::new(ClockId(4), "div_c", div)
                .with_parent(ClockId(2))
                .with_flags(ClockFlags::ALWAYS_ENABLED),
            ClockNode::new(ClockId(5), "div_d", div).with_parent(ClockId(1)),
        ]
    }

    fn init_all(tree: &ClockTree<'_>) {
        for node in tree.nodes() {
            tree.init(node.id()).unwrap();
        }
    }

    #[test]
    fn construction_checks_ids_and_parents() {
        let osc = Osc;
        let nodes = [
            ClockNode::new(ClockId(0), "a", &osc),
            ClockNode::new(ClockId(2), "b", &osc),
        ];
        assert!(matches!(ClockTree::new(&nodes), Err(ErrorCode::INVAL)));

        let nodes = [ClockNode::new(ClockId(0), "a", &osc).with_parent(ClockId(7))];
        assert!(matches!(ClockTree::new(&nodes), Err(ErrorCode::INVAL)));

        let nodes = [
            ClockNode::new(ClockId(0), "a", &osc).with_parent(ClockId(1)),
            ClockNode::new(ClockId(1), "b", &osc).with_parent(ClockId(0)),
        ];
        assert!(matches!(ClockTree::new(&nodes), Err(ErrorCode::INVAL)));
    }

    #[test]
    fn init_computes_rates_top_down() {
        let (osc, div) = (Osc, Dividers::new());
        let nodes = table(&osc, &div);
        let tree = ClockTree::new(&nodes).unwrap();
        assert_eq!(nodes[3].state(), ClockState::Uninitialized);
        init_all(&tree);
        assert_eq!(tree.rate(ClockId(0)), Ok(30_000_000));
        assert_eq!(tree.rate(ClockId(3)), Ok(30_000_000));
        assert_eq!(nodes[5].state(), ClockState::Running(27_000_000));
        assert_eq!(tree.lookup("div_d"), Some(ClockId(5)));
        assert_eq!(tree.lookup("nope"), None);
        assert_eq!(tree.children(ClockId(2)).count(), 2);
    }

    #[test]
    fn set_rate_propagates_to_children() {
        let (osc, div) = (Osc, Dividers::new());
        let nodes = table(&osc, &div);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        assert_eq!(tree.set_rate(ClockId(2), 10_000_000), Ok(()));
        assert_eq!(tree.rate(ClockId(2)), Ok(10_000_000));
        assert_eq!(tree.rate(ClockId(3)), Ok(10_000_000));
        assert_eq!(tree.rate(ClockId(4)), Ok(10_000_000));

        // div_b does not propagate, and has no children anyway.
        assert_eq!(tree.set_rate(ClockId(3), 5_000_000), Ok(()));
        assert_eq!(tree.rate(ClockId(3)), Ok(5_000_000));
        assert_eq!(tree.rate(ClockId(2)), Ok(10_000_000));
    }

    #[test]
    fn set_rate_argument_checks() {
        let (osc, div) = (Osc, Dividers::new());
        let nodes = table(&osc, &div);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        assert_eq!(tree.set_rate(ClockId(3), 0), Err(ErrorCode::INVAL));
        assert_eq!(tree.set_rate(ClockId(9), 1), Err(ErrorCode::INVAL));
        assert_eq!(tree.set_rate(ClockId(0), 1), Err(ErrorCode::NOSUPPORT));

        // Parent stopped.
        assert_eq!(tree.disable(ClockId(2)), Ok(()));
        assert_eq!(tree.set_rate(ClockId(3), 1_000_000), Err(ErrorCode::FAIL));
        assert_eq!(tree.rate(ClockId(3)), Ok(0));
    }

    #[test]
    fn failed_operation_keeps_cached_rate() {
        let (osc, div) = (Osc, Dividers::new());
        let nodes = table(&osc, &div);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        assert_eq!(tree.set_parent(ClockId(5), ClockId(4)), Err(ErrorCode::INVAL));
        assert_eq!(tree.parent(ClockId(5)), Ok(Some(ClockId(1))));
        assert_eq!(tree.rate(ClockId(5)), Ok(27_000_000));
    }

    #[test]
    fn set_parent_rejects_cycles() {
        let (osc, div) = (Osc, Dividers::new());
        let nodes = table(&osc, &div);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        assert_eq!(tree.set_parent(ClockId(2), ClockId(2)), Err(ErrorCode::INVAL));
        assert_eq!(tree.set_parent(ClockId(2), ClockId(3)), Err(ErrorCode::INVAL));
        assert_eq!(tree.set_parent(ClockId(2), ClockId(42)), Err(ErrorCode::INVAL));

        assert_eq!(tree.set_parent(ClockId(2), ClockId(1)), Ok(()));
        assert_eq!(tree.rate(ClockId(2)), Ok(27_000_000));
        assert_eq!(tree.rate(ClockId(3)), Ok(27_000_000));
    }

    #[test]
    fn always_enabled_ignores_disable() {
        let (osc, div) = (Osc, Dividers::new());
        let nodes = table(&osc, &div);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        assert_eq!(tree.disable(ClockId(4)), Ok(()));
        assert_eq!(tree.rate(ClockId(4)), Ok(30_000_000));
        assert!(!div.gated[2].get());

        assert_eq!(tree.disable(ClockId(3)), Ok(()));
        assert_eq!(nodes[3].state(), ClockState::Stopped);
        assert_eq!(tree.enable(ClockId(3)), Ok(()));
        assert_eq!(tree.rate(ClockId(3)), Ok(30_000_000));
    }

    #[test]
    fn zero_rate_iff_parent_stopped() {
        let (osc, div) = (Osc, Dividers::new());
        let nodes = table(&osc, &div);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        assert_eq!(tree.disable(ClockId(2)), Ok(()));
        assert_eq!(tree.rate(ClockId(3)), Ok(0));
        assert_eq!(tree.enable(ClockId(2)), Ok(()));
        assert_eq!(tree.rate(ClockId(3)), Ok(30_000_000));
        for node in tree.nodes().iter().filter(|node| !node.is_root()) {
            assert_eq!(node.rate() == 0, tree.parent_rate(node) == 0);
        }
    }

    #[test]
    fn recalc_is_idempotent() {
        let (osc, div) = (Osc, Dividers::new());
        let nodes = table(&osc, &div);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        let first = tree.recalc(ClockId(5)).unwrap();
        assert_eq!(tree.recalc(ClockId(5)), Ok(first));
        assert_eq!(tree.rate(ClockId(5)), Ok(first));
    }

    #[test]
    fn unknown_node_is_rejected_by_bank() {
        let (osc, div) = (Osc, Dividers::new());
        let nodes = [
            ClockNode::new(ClockId(0), "osc", &osc).with_nominal(1),
            ClockNode::new(ClockId(1), "stray", &div).with_parent(ClockId(0)),
        ];
        let tree = ClockTree::new(&nodes).unwrap();
        assert_eq!(tree.init(ClockId(1)), Err(ErrorCode::INVAL));
        assert_eq!(nodes[1].state(), ClockState::Uninitialized);
    }

    #[test]
    fn handle_exposes_consumer_operations() {
        let (osc, div) = (Osc, Dividers::new());
        let nodes = table(&osc, &div);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        let clk = tree.handle(ClockId(5)).unwrap();
        assert_eq!(clk.name(), "div_d");
        assert_eq!(clk.set_rate(9_000_000), Ok(9_000_000));
        assert!(clk.is_enabled());
        assert_eq!(clk.disable(), Ok(()));
        assert!(!clk.is_enabled());
        assert_eq!(clk.rate(), 0);
        assert_eq!(clk.enable(), Ok(()));
        assert_eq!(clk.recalc(), Ok(9_000_000));
        assert!(tree.handle(ClockId(6)).is_err());
    }
}
