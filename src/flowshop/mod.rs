//! Recipe-driven flow-shop planner.
//!
//! # Pipeline
//!
//! 1. **Registration**: recipes become shared [`RecipeTemplate`]s in the
//!    planner's [`RecipeCatalog`]; duration functions are linked by code.
//! 2. **Ignition**: every order is instantiated over every candidate recipe
//!    for its material; durations are resolved first, so structural errors
//!    surface before any variable is allocated.
//! 3. **Constraints**: dependencies, resource exclusivity, single recipe
//!    selection and optional groups (see [`constraints`]).
//! 4. **Objective**: the configured targets (see [`objective`]).
//! 5. **Solve** through an injected [`Solver`].
//! 6. **Translation**: the chosen instances become plans appended to the
//!    input program, together with the stop plans.
//!
//! A run that finds no solution returns the caller's program and demand
//! unchanged, with the solver status.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use recipe_schedule::config::PlannerConfig;
//! use recipe_schedule::cp::PumpkinSolver;
//! use recipe_schedule::duration::fixed;
//! use recipe_schedule::flowshop::FlowShop;
//! use recipe_schedule::models::*;
//!
//! let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let recipe = Recipe::new("ALE")
//!     .with_material(Material::new("beer"))
//!     .with_process(Process::new("BREW", "two").with_resource(Resource::processor("KETTLE")));
//!
//! let mut planner = FlowShop::new(PlannerConfig::new().with_pivot(t0).with_scale(TimeScale::Hours));
//! planner.add_recipes(&[recipe], false).unwrap();
//! planner.link_function("two", fixed(2)).unwrap();
//! planner
//!     .set_demand(&Demand::new("D1", t0, t0 + Duration::hours(8)).with_order(Order::new(
//!         "O1",
//!         Material::new("beer"),
//!         t0,
//!         t0 + Duration::hours(8),
//!     )))
//!     .unwrap();
//!
//! let outcome = planner.run(&PumpkinSolver::new()).unwrap();
//! assert!(outcome.status.is_solution_found());
//! assert_eq!(outcome.program.plan_count(), 1);
//! ```
//!
//! # Reference
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 6 (flow shops)
//! - Laborie et al. (2018), "IBM ILOG CP optimizer for scheduling"

pub mod constraints;
pub mod ignition;
pub mod objective;
pub mod translator;

pub use ignition::{OrTuple, RecipeInstance};
pub use objective::{CompiledObjective, OptimizationMode, Target};

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::catalog::RecipeCatalog;
use crate::config::PlannerConfig;
use crate::cp::{CpModel, SolveStatus, Solver};
use crate::duration::{DurationFn, DurationRegistry};
use crate::error::{CatalogError, PlanningError, Result};
use crate::graph::RecipeTemplate;
use crate::models::{Demand, Order, Pivot, Program, Recipe, Stop};
use crate::validation::{validate_demand, validate_program, validate_recipes, validate_stops};

use constraints::ResourceIntervals;

/// The recipe chosen for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSelection {
    pub order: String,
    pub recipe: String,
}

/// Result of a planner run.
#[derive(Debug, Clone)]
pub struct FlowShopOutcome {
    pub status: SolveStatus,
    /// Input program plus stop and new plans, or the input program
    /// unchanged when no solution was found.
    pub program: Program,
    /// The demand the run planned for.
    pub demand: Demand,
    /// Recipe chosen per order, in demand order. Empty without a solution.
    pub selections: Vec<RecipeSelection>,
    /// Value of each configured target.
    pub objective: Vec<(Target, i64)>,
}

impl FlowShopOutcome {
    /// Recipe chosen for an order.
    pub fn selection(&self, order_code: &str) -> Option<&str> {
        self.selections
            .iter()
            .find(|s| s.order == order_code)
            .map(|s| s.recipe.as_str())
    }
}

/// A model ready for solving, with the handles needed to read it back.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    pub model: CpModel,
    pub pivot: Pivot,
    pub instances: Vec<RecipeInstance>,
    pub objective: CompiledObjective,
    /// Input program plus stop plans.
    pub program: Program,
}

/// Build-and-solve planner over registered recipes.
#[derive(Debug, Clone)]
pub struct FlowShop {
    config: PlannerConfig,
    catalog: RecipeCatalog,
    durations: DurationRegistry,
    demand: Option<Demand>,
    program: Program,
    stops: Vec<Stop>,
}

impl FlowShop {
    /// Creates a planner with an empty catalog and program.
    pub fn new(config: PlannerConfig) -> Self {
        let at = config.pivot.unwrap_or_default();
        Self {
            config,
            catalog: RecipeCatalog::new(),
            durations: DurationRegistry::new(),
            demand: None,
            program: Program::new("program", at, at),
            stops: Vec::new(),
        }
    }

    /// Uses an existing catalog.
    pub fn with_catalog(mut self, catalog: RecipeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    pub fn demand(&self) -> Option<&Demand> {
        self.demand.as_ref()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Validates and registers recipes. `locked` applies to every recipe of
    /// this call; codes already registered are ignored. Returns the number
    /// of recipes added.
    pub fn add_recipes(&mut self, recipes: &[Recipe], locked: bool) -> Result<usize> {
        validate_recipes(recipes)?;
        let mut added = 0;
        for recipe in recipes {
            if self.catalog.add_recipe(recipe, locked)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Links a duration function to a code.
    pub fn link_function(
        &mut self,
        code: impl Into<String>,
        function: impl DurationFn + 'static,
    ) -> Result<()> {
        Ok(self.durations.link(code, function)?)
    }

    /// Sets the demand to plan.
    pub fn set_demand(&mut self, demand: &Demand) -> Result<()> {
        validate_demand(demand)?;
        self.demand = Some(demand.clone());
        Ok(())
    }

    /// Sets the committed program new plans must not overlap.
    pub fn set_program(&mut self, program: &Program) -> Result<()> {
        validate_program(program)?;
        self.program = program.clone();
        Ok(())
    }

    /// Adds resource stoppages.
    pub fn add_stops(&mut self, stops: &[Stop]) -> Result<()> {
        validate_stops(stops)?;
        self.stops.extend_from_slice(stops);
        Ok(())
    }

    /// Adds an objective target and sets the direction.
    pub fn optimize(&mut self, target: Target, mode: OptimizationMode) {
        if !self.config.targets.contains(&target) {
            self.config.targets.push(target);
        }
        self.config.mode = mode;
    }

    /// Builds the model without solving it.
    ///
    /// # Errors
    /// - [`PlanningError::Config`] without a demand
    /// - [`CatalogError::NoRecipe`] for an order no recipe produces
    /// - duration errors for unlinked functions or negative durations
    pub fn build(&self) -> Result<CompiledModel> {
        let demand = self.require_demand()?;
        let pivot = self.config.resolve_pivot();

        let resolved = self.resolve(demand)?;

        let mut model = CpModel::new(demand.code.as_str());
        let mut instances = Vec::with_capacity(resolved.len());
        for (template, order, durations) in resolved {
            let locked = template.is_locked();
            let mut instance = ignition::ignite_recipe(&mut model, template, order, durations, &pivot);
            if locked {
                ignition::ignite_transitions(&mut model, &mut instance);
            }
            instances.push(instance);
        }

        let mut program = self.program.clone();
        translator::insert_stops(&mut program, &self.stops);
        let fixed = ignition::ignite_program(&mut model, &program, &pivot);

        let mut intervals = ResourceIntervals::new();
        for instance in &instances {
            constraints::add_dependencies(&mut model, instance);
            constraints::add_optional_groups(&mut model, instance);
            intervals.add_instance(instance);
        }
        intervals.add_fixed(&fixed);
        constraints::add_resource_no_overlap(&mut model, &intervals);
        for order in &demand.orders {
            constraints::add_single_recipe(
                &mut model,
                instances.iter().filter(|i| i.order.code == order.code),
            );
        }

        let objective = objective::compile_objective(
            &mut model,
            &instances,
            &self.config.targets,
            self.config.mode,
        );

        info!(
            orders = demand.orders.len(),
            instances = instances.len(),
            vars = model.var_count(),
            intervals = model.interval_count(),
            constraints = model.constraint_count(),
            "model built"
        );

        Ok(CompiledModel {
            model,
            pivot,
            instances,
            objective,
            program,
        })
    }

    /// Builds, solves and translates.
    ///
    /// Structural problems are errors; solver outcomes are statuses.
    #[instrument(skip_all, fields(demand = self.demand.as_ref().map(|d| d.code.as_str())))]
    pub fn run<S: Solver + ?Sized>(&self, solver: &S) -> Result<FlowShopOutcome> {
        let demand = self.require_demand()?.clone();
        let compiled = self.build()?;

        let solution = solver.solve(&compiled.model, &self.config.solver);
        info!(status = %solution.status, objective = ?solution.objective_value, "solver finished");

        if !solution.is_solution_found() {
            warn!(status = %solution.status, "no solution, returning input program");
            return Ok(FlowShopOutcome {
                status: solution.status,
                program: self.program.clone(),
                demand,
                selections: Vec::new(),
                objective: Vec::new(),
            });
        }

        let mut program = compiled.program;
        let mut selections = Vec::new();
        for instance in &compiled.instances {
            translator::insert_plans(&mut program, &solution, instance, &compiled.pivot);
            if solution.bool_value(instance.recipe_flag) == Some(true) {
                selections.push(RecipeSelection {
                    order: instance.order.code.clone(),
                    recipe: instance.template.code().to_string(),
                });
            }
        }
        program.reset_interval();

        let objective = compiled
            .objective
            .terms
            .iter()
            .map(|(target, expr)| (*target, expr.evaluate(&solution.values)))
            .collect();

        debug!(plans = program.plan_count(), "program translated");
        Ok(FlowShopOutcome {
            status: solution.status,
            program,
            demand,
            selections,
            objective,
        })
    }

    fn require_demand(&self) -> Result<&Demand> {
        self.demand
            .as_ref()
            .ok_or_else(|| PlanningError::Config("no demand set".into()))
    }

    /// Candidate templates and durations per order, in demand order.
    fn resolve<'a>(
        &'a self,
        demand: &'a Demand,
    ) -> Result<Vec<(Arc<RecipeTemplate>, &'a Order, Vec<i64>)>> {
        let mut resolved = Vec::new();
        for order in &demand.orders {
            let candidates = self.catalog.candidates(&order.material.code);
            if candidates.is_empty() {
                return Err(CatalogError::NoRecipe {
                    order: order.code.clone(),
                    material: order.material.code.clone(),
                }
                .into());
            }
            for template in candidates {
                self.durations.check(template)?;
                let durations = self.durations.resolve(template, order)?;
                resolved.push((Arc::clone(template), order, durations));
            }
        }
        debug!(instances = resolved.len(), "durations resolved");
        Ok(resolved)
    }
}
