// End-to-end planner scenarios.


use chrono::Duration;
use recipe_schedule::config::PlannerConfig;
use recipe_schedule::cp::{PumpkinSolver, SolveStatus};
use recipe_schedule::duration::fixed;
use recipe_schedule::flowshop::{FlowShop, OptimizationMode, Target};
use recipe_schedule::models::{Material, Order, Plan, Process, Program, ProcessLink, Recipe, Resource, Stop};
use recipe_schedule::PlanningError;
use test_helpers::*;

fn planner(recipes: &[Recipe], locked: bool) -> FlowShop {
    recipe_schedule::logging::init_test();
    let mut planner = FlowShop::new(hours_config());
    planner.add_recipes(recipes, locked).unwrap();
    for (code, units) in [("one", 1), ("two", 2), ("three", 3)] {
        planner.link_function(code, fixed(units)).unwrap();
    }
    planner
}

#[test]
fn test_chain_on_one_resource() {
    let recipes = [chain_recipe("R1", "beer", &[("A", "two", "M1"), ("B", "three", "M1")])];
    let mut planner = planner(&recipes, false);
    planner.set_demand(&demand(vec![order("O1", "beer", 0, 10)])).unwrap();
    planner.optimize(Target::CompletionTime, OptimizationMode::Minimize);

    let outcome = planner.run(&PumpkinSolver::new()).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);

    let a = plans_of(&outcome.program, "O1", "A")[0];
    let b = plans_of(&outcome.program, "O1", "B")[0];
    assert_eq!(a.duration(), Duration::hours(2));
    assert_eq!(b.duration(), Duration::hours(3));
    assert_eq!(b.start_at, a.end_at);
    assert!(a.start_at >= hours(0) && b.end_at <= hours(10));
    assert_contained(&outcome);
}

#[test]
fn test_identical_orders_packed_back_to_back() {
    let recipes = [chain_recipe("R1", "beer", &[("A", "two", "M1"), ("B", "three", "M1")])];
    let mut planner = planner(&recipes, false);
    let orders = (1..=3).map(|k| order(&format!("O{k}"), "beer", 0, 40)).collect();
    planner.set_demand(&demand(orders)).unwrap();
    planner.optimize(Target::CompletionTime, OptimizationMode::Minimize);

    let outcome = planner.run(&PumpkinSolver::new()).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(outcome.objective, vec![(Target::CompletionTime, 15)]);
    assert_eq!(outcome.program.plan_count(), 6);
    assert!(outcome.program.is_overlap_free());
    assert_dependencies(&outcome, &recipes);
    assert_contained(&outcome);
}

#[test]
fn test_single_selection_between_candidates() {
    let recipes = [
        chain_recipe("SLOW", "beer", &[("A", "three", "M1"), ("B", "three", "M2")]),
        chain_recipe("FAST", "beer", &[("X", "one", "M3")]),
    ];
    let mut planner = planner(&recipes, false);
    planner
        .set_demand(&demand(vec![
            order("O1", "beer", 0, 12),
            order("O2", "beer", 0, 12),
        ]))
        .unwrap();

    let outcome = planner.run(&PumpkinSolver::new()).unwrap();
    assert!(outcome.status.is_solution_found());
    assert_eq!(outcome.selections.len(), 2);

    for code in ["O1", "O2"] {
        let recipe = outcome.selection(code).unwrap();
        let plans = outcome.program.plans_for_order(code);
        assert!(!plans.is_empty());
        assert!(plans
            .iter()
            .all(|p| p.process_link().is_some_and(|l| l.recipe == recipe)));
    }
    assert!(outcome.program.is_overlap_free());
    assert_dependencies(&outcome, &recipes);
}

#[test]
fn test_completion_time_prefers_faster_recipe() {
    let recipes = [
        chain_recipe("SLOW", "beer", &[("A", "three", "M1"), ("B", "three", "M2")]),
        chain_recipe("FAST", "beer", &[("X", "one", "M3")]),
    ];
    let mut planner = planner(&recipes, false);
    planner.set_demand(&demand(vec![order("O1", "beer", 0, 12)])).unwrap();
    planner.optimize(Target::CompletionTime, OptimizationMode::Minimize);

    let outcome = planner.run(&PumpkinSolver::new()).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(outcome.selection("O1"), Some("FAST"));
    assert_eq!(outcome.objective, vec![(Target::CompletionTime, 1)]);
}

#[test]
fn test_optional_group_exclusivity() {
    let recipe = Recipe::new("R1")
        .with_material(Material::new("beer"))
        .with_process(
            process("A", "one", "M1")
                .with_successor("X")
                .with_successor("Y"),
        )
        .with_process(
            process("X", "two", "M2")
                .with_optional_group("cool")
                .with_successor("C"),
        )
        .with_process(
            process("Y", "three", "M3")
                .with_optional_group("cool")
                .with_successor("C"),
        )
        .with_process(process("C", "one", "M1"));
    let recipes = [recipe];
    let mut planner = planner(&recipes, false);
    planner
        .set_demand(&demand(vec![
            order("O1", "beer", 0, 20),
            order("O2", "beer", 0, 20),
        ]))
        .unwrap();

    let outcome = planner.run(&PumpkinSolver::new()).unwrap();
    assert!(outcome.status.is_solution_found());
    for code in ["O1", "O2"] {
        let x = plans_of(&outcome.program, code, "X").len();
        let y = plans_of(&outcome.program, code, "Y").len();
        assert_eq!(x + y, 1, "exactly one cooling step for {code}");
        assert_eq!(plans_of(&outcome.program, code, "A").len(), 1);
        assert_eq!(plans_of(&outcome.program, code, "C").len(), 1);
    }
    assert!(outcome.program.is_overlap_free());
    assert_dependencies(&outcome, &recipes);
    assert_contained(&outcome);
}

#[test]
fn test_locked_recipe_holds_resource_between_steps() {
    let locked = [chain_recipe("HOLD", "beer", &[("FILL", "one", "TANK"), ("DRAIN", "one", "TANK")])];
    let free = [chain_recipe("RINSE", "water", &[("RINSE", "one", "TANK")])];

    recipe_schedule::logging::init_test();
    let mut planner = FlowShop::new(hours_config());
    planner.add_recipes(&locked, true).unwrap();
    planner.add_recipes(&free, false).unwrap();
    planner.link_function("one", fixed(1)).unwrap();
    planner
        .set_demand(&demand(vec![
            order("O1", "beer", 0, 10),
            order("O2", "water", 0, 10),
        ]))
        .unwrap();
    planner.optimize(Target::TransitionTotal, OptimizationMode::Minimize);
    let compiled = planner.build().unwrap();
    assert_eq!(compiled.instances[0].transition_tuples().count(), 1);

    let outcome = planner.run(&PumpkinSolver::new()).unwrap();
    assert!(outcome.status.is_solution_found());
    assert_eq!(outcome.objective, vec![(Target::TransitionTotal, 0)]);

    let fill = plans_of(&outcome.program, "O1", "FILL")[0];
    let drain = plans_of(&outcome.program, "O1", "DRAIN")[0];
    let rinse = plans_of(&outcome.program, "O2", "RINSE")[0];
    // nothing else runs on the tank between fill and drain
    assert!(rinse.end_at <= fill.start_at || rinse.start_at >= drain.end_at);
    assert!(outcome.program.is_overlap_free());
}

#[test]
fn test_committed_program_and_stops() {
    let recipes = [chain_recipe("R1", "beer", &[("A", "two", "M1"), ("B", "two", "M2")])];
    let mut planner = planner(&recipes, false);
    planner.set_demand(&demand(vec![order("O1", "beer", 0, 12)])).unwrap();

    let committed = Program::new("P", hours(0), hours(3)).with_plan(Plan::process(
        Resource::processor("M1"),
        hours(0),
        hours(3),
        ProcessLink::new("A", "O0", "R1", "beer"),
    ));
    planner.set_program(&committed).unwrap();
    planner
        .add_stops(&[
            Stop::new("S1", "cleaning", hours(4), hours(6)).with_resource(Resource::processor("M2")),
            Stop::new("S2", "cleaning", hours(5), hours(7)).with_resource(Resource::processor("M2")),
        ])
        .unwrap();

    let outcome = planner.run(&PumpkinSolver::new()).unwrap();
    assert!(outcome.status.is_solution_found());
    // committed plan + one squashed stop + two new plans
    assert_eq!(outcome.program.plan_count(), 4);
    assert_eq!(outcome.program.plans[0], committed.plans[0]);

    let stop = outcome.program.plans.iter().find(|p| p.is_stop()).unwrap();
    assert_eq!((stop.start_at, stop.end_at), (hours(4), hours(7)));
    assert!(outcome.program.is_overlap_free());
    assert!(plans_of(&outcome.program, "O1", "A")[0].start_at >= hours(3));
    assert_eq!(outcome.program.start_at, hours(0));
}

#[test]
fn test_infeasible_window_returns_input() {
    let recipes = [chain_recipe("R1", "beer", &[("A", "two", "M1"), ("B", "three", "M1")])];
    let mut planner = planner(&recipes, false);
    planner.set_demand(&demand(vec![order("O1", "beer", 0, 4)])).unwrap();

    let outcome = planner.run(&PumpkinSolver::new()).unwrap();
    assert_eq!(outcome.status, SolveStatus::Infeasible);
    assert_eq!(outcome.program, *planner.program());
    assert!(outcome.program.plans.is_empty());
    assert_eq!(outcome.demand.orders.len(), 1);
}

#[test]
fn test_structural_errors_before_solving() {
    let cyclic = Recipe::new("LOOP")
        .with_material(Material::new("beer"))
        .with_process(process("A", "one", "M1").with_successor("B"))
        .with_process(process("B", "one", "M1").with_successor("A"));
    let mut shop = FlowShop::new(hours_config());
    assert!(matches!(
        shop.add_recipes(&[cyclic], false),
        Err(PlanningError::Validation(_))
    ));

    let dangling = Recipe::new("DANGLING")
        .with_material(Material::new("beer"))
        .with_process(process("A", "one", "M1").with_successor("Z"));
    assert!(matches!(
        shop.add_recipes(&[dangling], false),
        Err(PlanningError::Validation(_))
    ));

    let bad_window = demand(vec![Order::new("O1", Material::new("beer"), hours(5), hours(1))]);
    assert!(matches!(
        shop.set_demand(&bad_window),
        Err(PlanningError::Validation(_))
    ));
    assert!(matches!(
        shop.add_stops(&[Stop::new("S1", "cleaning", hours(0), hours(1))]),
        Err(PlanningError::Validation(_))
    ));
}

#[test]
fn test_negative_duration_rejected() {
    let recipes = [chain_recipe("R1", "beer", &[("A", "minus", "M1")])];
    let mut planner = planner(&recipes, false);
    planner.link_function("minus", fixed(-1)).unwrap();
    planner.set_demand(&demand(vec![order("O1", "beer", 0, 10)])).unwrap();
    assert!(matches!(
        planner.run(&PumpkinSolver::new()),
        Err(PlanningError::Duration(_))
    ));
}

#[test]
fn test_quantity_driven_durations() {
    let recipe = Recipe::new("R1")
        .with_material(Material::new("beer"))
        .with_process(Process::new("BREW", "per_100l").with_resource(Resource::processor("K")));
    let mut planner = FlowShop::new(hours_config());
    planner.add_recipes(&[recipe], false).unwrap();
    planner
        .link_function("per_100l", |o: &Order, _: &Process| {
            (o.quantity / 100.0).ceil() as i64
        })
        .unwrap();
    planner
        .set_demand(&demand(vec![order("O1", "beer", 0, 10).with_quantity(250.0)]))
        .unwrap();

    let outcome = planner.run(&PumpkinSolver::new()).unwrap();
    let brew = plans_of(&outcome.program, "O1", "BREW")[0];
    assert_eq!(brew.duration(), Duration::hours(3));
}

#[test]
fn test_config_from_json_drives_run() {
    let config = PlannerConfig::from_json(
        r#"{
            "pivot": "2024-01-01T00:00:00Z",
            "scale": "hours",
            "targets": ["makespan"],
            "solver": {"max_time_seconds": 5.0, "num_workers": 1}
        }"#,
    )
    .unwrap();
    let mut planner = FlowShop::new(config);
    planner
        .add_recipes(&[chain_recipe("R1", "beer", &[("A", "two", "M1")])], false)
        .unwrap();
    planner.link_function("two", fixed(2)).unwrap();
    planner
        .set_demand(&demand(vec![
            order("O1", "beer", 0, 10),
            order("O2", "beer", 0, 10),
        ]))
        .unwrap();

    let outcome = planner.run(&PumpkinSolver::new()).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(outcome.objective, vec![(Target::CompletionTime, 4)]);
    assert_eq!(outcome.program.end_at, hours(4));
}

#[test]
fn test_planners_run_concurrently() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FlowShop>();

    let recipes = [chain_recipe("R1", "beer", &[("A", "two", "M1"), ("B", "one", "M2")])];
    let mut shop = planner(&recipes, false);
    shop.set_demand(&demand(vec![order("O1", "beer", 0, 10)])).unwrap();

    let shop = &shop;
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..3)
            .map(|_| s.spawn(move || shop.run(&PumpkinSolver::new()).unwrap()))
            .collect();
        for handle in handles {
            let outcome = handle.join().unwrap();
            assert!(outcome.status.is_solution_found());
            assert_eq!(outcome.program.plan_count(), 2);
        }
    });
}
