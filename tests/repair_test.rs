// Overlap-repair scenarios.


use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recipe_schedule::catalog::RecipeCatalog;
use recipe_schedule::config::RepairConfig;
use recipe_schedule::cp::PumpkinSolver;
use recipe_schedule::duration::fixed;
use recipe_schedule::flowshop::FlowShop;
use recipe_schedule::models::{Plan, ProcessLink, Program, Resource};
use recipe_schedule::repair::{OverlapRepair, RepairStatus};
use test_helpers::*;

fn single_step_catalog() -> RecipeCatalog {
    let mut catalog = RecipeCatalog::new();
    catalog
        .add_recipe(&chain_recipe("PRESS", "wine", &[("PRESS", "f", "M1")]), false)
        .unwrap();
    catalog
}

fn press(order: &str, start_h: i64, end_h: i64) -> Plan {
    Plan::process(
        Resource::processor("M1"),
        hours(start_h),
        hours(end_h),
        ProcessLink::new("PRESS", order, "PRESS", "wine"),
    )
}

#[test]
fn test_three_overlapping_plans() {
    recipe_schedule::logging::init_test();
    let program = Program::new("P", hours(0), hours(4))
        .with_plan(press("O1", 0, 2))
        .with_plan(press("O2", 1, 3))
        .with_plan(press("O3", 2, 4));

    let repair = OverlapRepair::new(RepairConfig::new().with_gap_seconds(0));
    let outcome = repair.run(&program, &single_step_catalog(), hours(0)).unwrap();

    assert_eq!(outcome.status, RepairStatus::Repaired);
    let spans: Vec<_> = outcome
        .program
        .plans
        .iter()
        .map(|p| (p.start_at, p.end_at))
        .collect();
    assert_eq!(
        spans,
        vec![(hours(0), hours(2)), (hours(2), hours(4)), (hours(4), hours(6))]
    );
    // the input is untouched
    assert_eq!(program.plans[1].start_at, hours(1));
}

#[test]
fn test_repair_after_manual_edit_keeps_dependencies() {
    recipe_schedule::logging::init_test();
    let recipes = [
        chain_recipe("BREW", "beer", &[("MASH", "two", "M1"), ("BOIL", "two", "M2"), ("COOL", "one", "M3")]),
    ];
    let mut planner = FlowShop::new(hours_config());
    planner.add_recipes(&recipes, false).unwrap();
    planner.link_function("two", fixed(2)).unwrap();
    planner.link_function("one", fixed(1)).unwrap();
    planner
        .set_demand(&demand(vec![
            order("O1", "beer", 0, 24),
            order("O2", "beer", 0, 24),
        ]))
        .unwrap();
    let outcome = planner.run(&PumpkinSolver::new()).unwrap();
    assert!(outcome.status.is_solution_found());

    // drag O2's mash onto O1's mash
    let mut edited = outcome.program.clone();
    let o1_mash = edited
        .plans
        .iter()
        .position(|p| p.process_link().is_some_and(|l| l.order == "O1" && l.process == "MASH"))
        .unwrap();
    let o2_mash = edited
        .plans
        .iter()
        .position(|p| p.process_link().is_some_and(|l| l.order == "O2" && l.process == "MASH"))
        .unwrap();
    let target = edited.plans[o1_mash].start_at;
    edited.plans[o2_mash].move_to(target);
    assert!(!edited.is_overlap_free());

    let repair = OverlapRepair::new(RepairConfig::new().with_gap_seconds(60));
    let repaired = repair.run(&edited, planner.catalog(), hours(0)).unwrap();
    assert_eq!(repaired.status, RepairStatus::Repaired);
    assert!(repaired.program.is_overlap_free());

    for order in ["O1", "O2"] {
        let step = |process: &str| plans_of(&repaired.program, order, process)[0].clone();
        let (mash, boil, cool) = (step("MASH"), step("BOIL"), step("COOL"));
        assert!(mash.end_at <= boil.start_at);
        assert!(boil.end_at <= cool.start_at);
        assert_eq!(mash.duration(), Duration::hours(2));
    }
}

#[test]
fn test_repair_terminates_on_random_programs() {
    let catalog = single_step_catalog();
    let mut rng = StdRng::seed_from_u64(42);

    for round in 0..20 {
        let mut program = Program::new("P", hours(0), hours(0));
        for i in 0..rng.random_range(2..12) {
            let start = rng.random_range(0..10);
            let length = rng.random_range(1..4);
            program.add_plan(press(&format!("O{i}"), start, start + length));
        }
        let max_iterations = rng.random_range(1..6);
        let repair = OverlapRepair::new(
            RepairConfig::new()
                .with_max_iterations(max_iterations)
                .with_gap_seconds(0),
        );

        let outcome = repair.run(&program, &catalog, hours(0)).unwrap();
        assert!(outcome.iterations <= max_iterations, "round {round}");
        match outcome.status {
            RepairStatus::Repaired => assert!(outcome.program.is_overlap_free()),
            RepairStatus::Unrepairable => {
                assert!(!outcome.program.is_overlap_free());
                assert_eq!(outcome.iterations, max_iterations, "round {round}");
            }
            other => panic!("unexpected status {other} in round {round}"),
        }
        // durations survive any number of moves
        for (before, after) in program.plans.iter().zip(&outcome.program.plans) {
            assert_eq!(before.duration(), after.duration());
            assert!(after.start_at >= before.start_at);
        }
    }
}
