//! Behavior tree used when the learner declines to act
//!
//! Nodes are evaluated top-down once per tick against a [`TreeContext`].
//! Only [`Node::Repeater`] carries state between ticks.

use serde::{Deserialize, Serialize};

use pet_rl_core::{Need, PetAction};

/// Result of evaluating a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Node finished successfully
    Success,
    /// Node finished unsuccessfully
    Failure,
    /// Node needs more ticks
    Running,
}

/// What the tree can observe and do
pub trait TreeContext {
    /// Current value of a need
    fn need(&self, need: Need) -> f64;

    /// Whether the pet is asleep
    fn is_sleeping(&self) -> bool;

    /// Run an action, returning whether it took effect
    fn perform(&mut self, action: PetAction) -> bool;
}

/// Leaf test against the context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Condition {
    /// Need strictly below a threshold
    Below {
        /// Need to read
        need: Need,
        /// Exclusive bound
        threshold: f64,
    },
    /// Need strictly above a threshold
    Above {
        /// Need to read
        need: Need,
        /// Exclusive bound
        threshold: f64,
    },
    /// Pet is asleep
    Sleeping,
    /// Pet is awake
    Awake,
}

impl Condition {
    fn holds(&self, ctx: &dyn TreeContext) -> bool {
        match self {
            Condition::Below { need, threshold } => ctx.need(*need) < *threshold,
            Condition::Above { need, threshold } => ctx.need(*need) > *threshold,
            Condition::Sleeping => ctx.is_sleeping(),
            Condition::Awake => !ctx.is_sleeping(),
        }
    }
}

/// Behavior tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Runs children in order until one does not succeed
    Sequence {
        /// Label for dumps and logs
        name: String,
        /// Children in evaluation order
        children: Vec<Node>,
    },
    /// Runs children in order until one does not fail
    Selector {
        /// Label for dumps and logs
        name: String,
        /// Children in evaluation order
        children: Vec<Node>,
    },
    /// Swaps success and failure
    Inverter {
        /// Wrapped node
        child: Box<Node>,
    },
    /// Counts child successes across ticks
    Repeater {
        /// Wrapped node
        child: Box<Node>,
        /// Successes needed to finish; `None` repeats forever
        limit: Option<u32>,
        /// Successes so far
        #[serde(default)]
        count: u32,
    },
    /// Always succeeds once the child has run
    Succeeder {
        /// Wrapped node
        child: Box<Node>,
    },
    /// Leaf test
    Condition(Condition),
    /// Leaf action
    Action {
        /// Action to perform
        action: PetAction,
    },
}

impl Node {
    /// Sequence node
    pub fn sequence(name: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Sequence {
            name: name.into(),
            children,
        }
    }

    /// Selector node
    pub fn selector(name: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Selector {
            name: name.into(),
            children,
        }
    }

    /// Inverter decorator
    #[must_use]
    pub fn inverter(child: Node) -> Self {
        Node::Inverter {
            child: Box::new(child),
        }
    }

    /// Repeater decorator
    #[must_use]
    pub fn repeater(child: Node, limit: Option<u32>) -> Self {
        Node::Repeater {
            child: Box::new(child),
            limit,
            count: 0,
        }
    }

    /// Succeeder decorator
    #[must_use]
    pub fn succeeder(child: Node) -> Self {
        Node::Succeeder {
            child: Box::new(child),
        }
    }

    /// `need < threshold`
    #[must_use]
    pub fn below(need: Need, threshold: f64) -> Self {
        Node::Condition(Condition::Below { need, threshold })
    }

    /// `need > threshold`
    #[must_use]
    pub fn above(need: Need, threshold: f64) -> Self {
        Node::Condition(Condition::Above { need, threshold })
    }

    /// Action leaf
    #[must_use]
    pub fn action(action: PetAction) -> Self {
        Node::Action { action }
    }

    /// Evaluate this node once
    pub fn tick(&mut self, ctx: &mut dyn TreeContext) -> Status {
        match self {
            Node::Sequence { children, .. } => {
                for child in children {
                    let status = child.tick(ctx);
                    if status != Status::Success {
                        return status;
                    }
                }
                Status::Success
            }
            Node::Selector { children, .. } => {
                for child in children {
                    let status = child.tick(ctx);
                    if status != Status::Failure {
                        return status;
                    }
                }
                Status::Failure
            }
            Node::Inverter { child } => match child.tick(ctx) {
                Status::Success => Status::Failure,
                Status::Failure => Status::Success,
                Status::Running => Status::Running,
            },
            Node::Repeater {
                limit: Some(0),
                count,
                ..
            } => {
                *count = 0;
                Status::Success
            }
            Node::Repeater {
                child,
                limit,
                count,
            } => match child.tick(ctx) {
                Status::Success => {
                    *count += 1;
                    match limit {
                        Some(limit) if *count >= *limit => {
                            *count = 0;
                            Status::Success
                        }
                        _ => Status::Running,
                    }
                }
                Status::Failure => {
                    *count = 0;
                    Status::Failure
                }
                Status::Running => Status::Running,
            },
            Node::Succeeder { child } => {
                child.tick(ctx);
                Status::Success
            }
            Node::Condition(condition) => {
                if condition.holds(ctx) {
                    Status::Success
                } else {
                    Status::Failure
                }
            }
            Node::Action { action } => {
                if ctx.perform(*action) {
                    Status::Success
                } else {
                    Status::Failure
                }
            }
        }
    }
}

/// A tree built once and ticked for the lifetime of the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorTree {
    root: Node,
}

impl BehaviorTree {
    /// Wrap a root node
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// The standard pet tree: urgent needs in priority order, then
    /// exploring when rested, then resting unconditionally.
    #[must_use]
    pub fn pet_default() -> Self {
        let check = |name: &str, condition: Node, action: PetAction| {
            Node::sequence(name, vec![condition, Node::action(action)])
        };
        Self::new(Node::selector(
            "root",
            vec![
                check("health", Node::below(Need::Health, 30.0), PetAction::Rest),
                check("hunger", Node::above(Need::Hunger, 70.0), PetAction::Feed),
                check("energy", Node::below(Need::Energy, 30.0), PetAction::Sleep),
                check("hygiene", Node::below(Need::Hygiene, 30.0), PetAction::Clean),
                check("happiness", Node::below(Need::Happiness, 30.0), PetAction::Play),
                check("explore", Node::above(Need::Energy, 50.0), PetAction::Explore),
                Node::succeeder(Node::action(PetAction::Rest)),
            ],
        ))
    }

    /// Root node
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Evaluate the tree once
    pub fn tick(&mut self, ctx: &mut dyn TreeContext) -> Status {
        self.root.tick(ctx)
    }
}

impl Default for BehaviorTree {
    fn default() -> Self {
        Self::pet_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pet_rl_core::PetAttributes;

    struct FakePet {
        attributes: PetAttributes,
        sleeping: bool,
        succeed: bool,
        performed: Vec<PetAction>,
    }

    impl FakePet {
        fn new(attributes: PetAttributes) -> Self {
            Self {
                attributes,
                sleeping: false,
                succeed: true,
                performed: Vec::new(),
            }
        }
    }

    impl TreeContext for FakePet {
        fn need(&self, need: Need) -> f64 {
            self.attributes.get(need)
        }

        fn is_sleeping(&self) -> bool {
            self.sleeping
        }

        fn perform(&mut self, action: PetAction) -> bool {
            self.performed.push(action);
            self.succeed
        }
    }

    #[test]
    fn test_default_tree_feeds_hungry_pet() {
        let mut tree = BehaviorTree::pet_default();
        let mut pet = FakePet::new(PetAttributes::new(100.0, 85.0, 40.0, 80.0, 60.0));
        assert_eq!(tree.tick(&mut pet), Status::Success);
        assert_eq!(pet.performed, vec![PetAction::Feed]);
    }

    #[test]
    fn test_default_tree_health_first() {
        let mut tree = BehaviorTree::pet_default();
        let mut pet = FakePet::new(PetAttributes::new(10.0, 90.0, 10.0, 10.0, 10.0));
        tree.tick(&mut pet);
        assert_eq!(pet.performed, vec![PetAction::Rest]);
    }

    #[test]
    fn test_default_tree_falls_through_failures() {
        let mut tree = BehaviorTree::pet_default();
        let mut pet = FakePet::new(PetAttributes::new(100.0, 90.0, 40.0, 80.0, 60.0));
        pet.succeed = false;
        assert_eq!(tree.tick(&mut pet), Status::Success);
        assert_eq!(pet.performed, vec![PetAction::Feed, PetAction::Rest]);
    }

    #[test]
    fn test_inverter() {
        let mut pet = FakePet::new(PetAttributes::default());
        let mut node = Node::inverter(Node::below(Need::Hunger, 50.0));
        assert_eq!(node.tick(&mut pet), Status::Failure);
        let mut node = Node::inverter(Node::repeater(Node::action(PetAction::Rest), None));
        assert_eq!(node.tick(&mut pet), Status::Running);
    }

    #[test]
    fn test_repeater_counts_and_resets() {
        let mut pet = FakePet::new(PetAttributes::default());
        let mut node = Node::repeater(Node::action(PetAction::Play), Some(3));
        assert_eq!(node.tick(&mut pet), Status::Running);
        assert_eq!(node.tick(&mut pet), Status::Running);
        assert_eq!(node.tick(&mut pet), Status::Success);
        assert_eq!(node.tick(&mut pet), Status::Running);

        pet.succeed = false;
        assert_eq!(node.tick(&mut pet), Status::Failure);
        assert!(matches!(node, Node::Repeater { count: 0, .. }));
    }

    #[test]
    fn test_zero_limit_repeater_skips_child() {
        let mut pet = FakePet::new(PetAttributes::default());
        let mut node = Node::repeater(Node::action(PetAction::Play), Some(0));
        assert_eq!(node.tick(&mut pet), Status::Success);
        assert_eq!(node.tick(&mut pet), Status::Success);
        assert!(pet.performed.is_empty());
    }

    #[test]
    fn test_succeeder_masks_failure() {
        let mut pet = FakePet::new(PetAttributes::default());
        pet.succeed = false;
        let mut node = Node::succeeder(Node::action(PetAction::Train));
        assert_eq!(node.tick(&mut pet), Status::Success);
        assert_eq!(pet.performed, vec![PetAction::Train]);
    }

    #[test]
    fn test_tree_serializes() {
        let tree = BehaviorTree::pet_default();
        let json = serde_json::to_string(&tree).unwrap();
        assert!(json.contains(r#""type":"selector""#));
        let back: BehaviorTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
