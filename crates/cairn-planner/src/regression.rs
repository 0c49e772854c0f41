//! Backward best-first search over regression states.
//!
//! The search starts from the goal requirements and walks actions backwards:
//! an action can precede a regression state when one of its effects produces a
//! requirement of that state. Regressing through the action replaces the
//! produced requirements by their negation and adds the action's
//! preconditions. The search ends at the first popped state whose
//! requirements all hold in the real current state.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{BuildHasher, BuildHasherDefault};
use std::ops::Range;
use std::time::Instant;

use cairn_core::{ActionBind, ActionId, Plan, PlanError, PredicateBind, Result, ValueTable};
use cairn_state::State;
use tracing::{debug, enabled, info, trace, warn, Level};

use crate::binder::Binding;
use crate::domain::{Action, Domain, Goal};
use crate::planner::{HeuristicMode, Planner, PlannerConfig};
use crate::replay::Simulation;

/// Position of a node in the arena.
type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeStatus {
    Open,
    Closed,
}

/// Node in the regression search tree.
#[derive(Debug, Clone)]
struct SearchNode {
    /// Requirements still to be established.
    state: State,
    /// g(n): Cost of the actions between this state and the goal.
    g: f64,
    /// h(n): Heuristic estimate to the current state.
    h: f64,
    /// Action regressed to reach this node from its parent.
    action: Option<ActionBind>,
    parent: Option<NodeId>,
    /// Creation counter, breaks ties between equal f.
    order: u64,
    status: NodeStatus,
}

impl SearchNode {
    /// f(n) = g(n) + h(n).
    fn f(&self) -> f64 {
        self.g + self.h
    }

    fn key(&self, node: NodeId) -> OpenKey {
        OpenKey {
            f: self.f(),
            order: self.order,
            node,
        }
    }
}

/// Open-set ordering: lowest f first, then oldest node.
#[derive(Debug, Clone, Copy)]
struct OpenKey {
    f: f64,
    order: u64,
    node: NodeId,
}

impl PartialEq for OpenKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenKey {}

impl Ord for OpenKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f
            .total_cmp(&other.f)
            .then(self.order.cmp(&other.order))
            .then(self.node.cmp(&other.node))
    }
}

impl PartialOrd for OpenKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Goal-regression planner over a [`Domain`].
///
/// The node arena, open and closed sets and candidate buffers are scratch
/// space owned by the planner and reset at the start of every call, so one
/// instance serves any number of sequential `plan` calls.
pub struct RegressionPlanner<'d> {
    domain: &'d Domain,
    config: PlannerConfig,
    nodes: Vec<SearchNode>,
    open: BTreeSet<OpenKey>,
    /// Expanded nodes in pop order.
    closed: Vec<NodeId>,
    /// Nodes bucketed by state hash, for duplicate detection.
    seen: HashMap<u64, Vec<NodeId>>,
    hasher: BuildHasherDefault<DefaultHasher>,
    values: ValueTable,
    /// Effect matches of the action under consideration, grouped per effect.
    candidates: Vec<PredicateBind>,
    /// Range of `candidates` belonging to each effect.
    ranges: Vec<Range<usize>>,
    /// Current combination: one index into `candidates` per effect.
    cursor: Vec<usize>,
    matches: Vec<PredicateBind>,
    next_order: u64,
}

impl<'d> RegressionPlanner<'d> {
    /// Create a planner with default configuration.
    pub fn new(domain: &'d Domain) -> Self {
        Self::with_config(domain, PlannerConfig::default())
    }

    /// Create a planner with custom configuration.
    pub fn with_config(domain: &'d Domain, config: PlannerConfig) -> Self {
        Self {
            domain,
            config,
            nodes: Vec::new(),
            open: BTreeSet::new(),
            closed: Vec::new(),
            seen: HashMap::new(),
            hasher: BuildHasherDefault::default(),
            values: ValueTable::new(),
            candidates: Vec::new(),
            ranges: Vec::new(),
            cursor: Vec::new(),
            matches: Vec::new(),
            next_order: 0,
        }
    }

    /// The domain this planner searches.
    pub fn domain(&self) -> &'d Domain {
        self.domain
    }

    /// Plan with an opaque world context handed to every predicate evaluator.
    pub fn plan_in(&mut self, goal: &Goal, context: Option<&dyn Any>) -> Result<Plan> {
        let start_time = Instant::now();
        let domain = self.domain;

        info!(
            "Starting regression planning for goal with {} conditions",
            goal.conditions.len()
        );

        // Goal requirements, and what is actually true right now.
        let mut target = State::new();
        let mut real = State::new();
        for condition in &goal.conditions {
            let bind = condition.bind_values();
            target.set(bind, condition.state);
            real.set(bind, domain.evaluate(context, &goal.values, &bind));
        }

        if real == target {
            debug!("Goal already satisfied, returning empty plan");
            return Ok(Plan::satisfied(goal.values.clone()));
        }

        self.reset(goal);

        let h = self.heuristic(&target, &real);
        self.insert_node(target, 0.0, h, None, None);

        let mut states_explored = 0;

        while let Some(key) = self.open.pop_first() {
            let current = key.node;
            self.nodes[current].status = NodeStatus::Closed;
            self.closed.push(current);
            states_explored += 1;

            // Check resource limits
            if let Some(limit) = self.config.max_states_explored {
                if states_explored > limit {
                    warn!("Regression search exceeded max states explored limit");
                    return Err(PlanError::StateLimitExceeded { limit });
                }
            }

            let elapsed_ms = start_time.elapsed().as_millis() as u64;
            if let Some(limit_ms) = self.config.max_planning_time_ms {
                if elapsed_ms > limit_ms {
                    warn!("Regression search exceeded max planning time");
                    return Err(PlanError::TimeLimitExceeded { limit_ms });
                }
            }

            if enabled!(Level::TRACE) {
                trace!(
                    f = self.nodes[current].f(),
                    "Partial plan: {}",
                    self.describe_path(current)
                );
            }

            // Check if every remaining requirement already holds
            if self.is_goal_reached(current, &real) {
                let plan = self.reconstruct(current, states_explored);
                info!(
                    "Regression search found plan with {} steps, explored {} states in {}ms",
                    plan.len(),
                    states_explored,
                    elapsed_ms
                );
                return Ok(plan);
            }

            // Expand predecessors (try each action whose effects meet a requirement)
            for (id, action) in domain.actions_with_ids() {
                if !self.collect_candidates(current, action) {
                    continue;
                }

                loop {
                    self.expand(current, id, action, &mut real, context);
                    if !self.advance() {
                        break;
                    }
                }
            }
        }

        info!(
            "Regression search exhausted after exploring {} states",
            states_explored
        );
        Err(PlanError::Unreachable {
            explored: states_explored,
        })
    }

    fn reset(&mut self, goal: &Goal) {
        self.nodes.clear();
        self.open.clear();
        self.closed.clear();
        self.seen.clear();
        self.values = goal.values.clone();
        self.next_order = 0;
    }

    /// Heuristic function: requirements of `state` the real state does not meet.
    fn heuristic(&self, state: &State, real: &State) -> f64 {
        match self.config.heuristic {
            HeuristicMode::StateDifference => state - real,
            HeuristicMode::Zero => 0.0,
        }
    }

    /// Check whether the node's requirements all hold in the real state.
    fn is_goal_reached(&self, node: NodeId, real: &State) -> bool {
        self.nodes[node].state.meets(real)
    }

    fn fingerprint(&self, state: &State) -> u64 {
        self.hasher.hash_one(state)
    }

    fn insert_node(
        &mut self,
        state: State,
        g: f64,
        h: f64,
        action: Option<ActionBind>,
        parent: Option<NodeId>,
    ) {
        let id = self.nodes.len();
        let fingerprint = self.fingerprint(&state);
        let node = SearchNode {
            state,
            g,
            h,
            action,
            parent,
            order: self.next_order,
            status: NodeStatus::Open,
        };
        self.next_order += 1;
        self.open.insert(node.key(id));
        self.nodes.push(node);
        self.seen.entry(fingerprint).or_default().push(id);
    }

    fn find_node(&self, fingerprint: u64, state: &State) -> Option<NodeId> {
        self.seen
            .get(&fingerprint)?
            .iter()
            .copied()
            .find(|&id| self.nodes[id].state == *state)
    }

    /// Gather, per effect, the requirements of `node` it could produce.
    ///
    /// An effect whose predicate has no entry in the node is unconstrained.
    /// Returns false when some effect's predicate has entries but none with
    /// the effect's truth, or when no effect matches a concrete requirement;
    /// either way the action cannot precede this node.
    fn collect_candidates(&mut self, node: NodeId, action: &Action) -> bool {
        self.candidates.clear();
        self.ranges.clear();
        self.cursor.clear();

        let state = &self.nodes[node].state;
        let mut concrete = 0;

        for effect in &action.effects {
            let start = self.candidates.len();
            let recorded = state.range(effect.predicate);
            if recorded.is_empty() {
                self.candidates.push(PredicateBind::new(effect.predicate));
            } else {
                for bind in recorded {
                    if state.get(bind) == effect.state {
                        self.candidates.push(*bind);
                        concrete += 1;
                    }
                }
                if self.candidates.len() == start {
                    return false;
                }
            }
            self.ranges.push(start..self.candidates.len());
            self.cursor.push(start);
        }

        concrete > 0
    }

    /// Step `cursor` to the next combination. False once all were visited.
    fn advance(&mut self) -> bool {
        for (cursor, range) in self.cursor.iter_mut().zip(&self.ranges) {
            *cursor += 1;
            if *cursor < range.end {
                return true;
            }
            *cursor = range.start;
        }
        false
    }

    /// Regress `action` through the current combination of matches.
    fn expand(
        &mut self,
        current: NodeId,
        id: ActionId,
        action: &Action,
        real: &mut State,
        context: Option<&dyn Any>,
    ) {
        let domain = self.domain;

        self.matches.clear();
        self.matches
            .extend(self.cursor.iter().map(|&index| self.candidates[index]));

        let mark = self.values.len();
        let mut outcome = self.nodes[current].state.clone();
        let mut binding = Binding {
            action,
            matches: &self.matches,
            values: &mut self.values,
            bind: ActionBind::new(id),
            state: &mut outcome,
        };
        let applied = match action.binder() {
            Some(binder) => binder(&mut binding),
            None => binding.regress(),
        };
        let bind = binding.bind;

        if !applied {
            debug!("Binder rejected {} for this combination", action.name);
            self.values.truncate(mark);
            return;
        }
        if !bind.slots.is_bound(action.arity()) {
            debug!(
                "Discarding {} with unbound arguments",
                domain.describe(&bind, &self.values)
            );
            self.values.truncate(mark);
            return;
        }

        // Ground every fact the successor mentions in the real state.
        for (fact, _) in outcome.iter() {
            if !real.contains(fact) {
                real.set(*fact, domain.evaluate(context, &self.values, fact));
            }
        }

        let g = self.nodes[current].g + action.cost;
        let h = self.heuristic(&outcome, real);
        let fingerprint = self.fingerprint(&outcome);

        match self.find_node(fingerprint, &outcome) {
            Some(existing) if self.nodes[existing].status == NodeStatus::Closed => {
                debug!("Skipping already expanded state via {}", action.name);
            }
            Some(existing) => {
                if !self
                    .config
                    .open_update
                    .accepts(self.nodes[existing].g, g)
                {
                    return;
                }
                let old_key = self.nodes[existing].key(existing);
                self.open.remove(&old_key);

                let node = &mut self.nodes[existing];
                node.g = g;
                node.h = h;
                node.action = Some(bind);
                node.parent = Some(current);
                let new_key = node.key(existing);
                self.open.insert(new_key);
                debug!("Updated open state via {}", action.name);
            }
            None => {
                self.insert_node(outcome, g, h, Some(bind), Some(current));
            }
        }
    }

    /// Walk parent links from `terminal` to the root.
    ///
    /// The terminal node is the earliest regression state, so the walk
    /// already yields actions in execution order.
    fn reconstruct(&self, terminal: NodeId, explored: usize) -> Plan {
        let actions = self.path(terminal).collect();

        Plan {
            values: self.values.clone(),
            actions,
            cost: self.nodes[terminal].g,
            explored,
        }
    }

    fn path(&self, from: NodeId) -> impl Iterator<Item = ActionBind> + '_ {
        let mut node = Some(from);
        std::iter::from_fn(move || loop {
            let current = &self.nodes[node?];
            node = current.parent;
            if let Some(action) = current.action {
                return Some(action);
            }
        })
    }

    fn describe_path(&self, from: NodeId) -> String {
        let steps: Vec<String> = self
            .path(from)
            .map(|bind| self.domain.describe(&bind, &self.values))
            .collect();
        steps.join(" -> ")
    }
}

impl Planner for RegressionPlanner<'_> {
    fn plan(&mut self, goal: &Goal) -> Result<Plan> {
        self.plan_in(goal, None)
    }

    fn validate_plan(&self, plan: &Plan, goal: &Goal) -> bool {
        let mut simulation = Simulation::new(self.domain, &plan.values, None);
        simulation.run(plan, goal)
    }

    fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn set_config(&mut self, config: PlannerConfig) {
        self.config = config;
    }
}
