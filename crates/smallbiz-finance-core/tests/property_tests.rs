use proptest::prelude::*;
use rust_decimal::Decimal;
use smallbiz_finance_core::amortization::build_loan_schedule;
use smallbiz_finance_core::amortization::loan::LoanInput;
use smallbiz_finance_core::scenarios::analyze_scenarios;
use smallbiz_finance_core::scenarios::scenario::ScenarioAnalysisInput;
use smallbiz_finance_core::valuation::capital_budgeting::IrrInput;
use smallbiz_finance_core::valuation::wacc::WaccInput;
use smallbiz_finance_core::valuation::{compute_irr, compute_wacc, project_npv};
use smallbiz_finance_core::Decision;

/// Whole-currency cash flows.
fn flows_strategy() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(1i64..200_000, 1..12)
        .prop_map(|v| v.into_iter().map(Decimal::from).collect())
}

/// Rate in basis points, returned as a decimal fraction.
fn rate_strategy(max_bp: i64) -> impl Strategy<Value = Decimal> {
    (0..=max_bp).prop_map(|bp| Decimal::new(bp, 4))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn npv_decreases_as_rate_rises(
        flows in flows_strategy(),
        investment in 0i64..500_000,
        r1 in rate_strategy(9_000),
        step in 1i64..1_000,
    ) {
        let investment = Decimal::from(investment);
        let r2 = r1 + Decimal::new(step, 4);
        let lower = project_npv(investment, &flows, r1).unwrap();
        let higher = project_npv(investment, &flows, r2).unwrap();
        prop_assert!(higher < lower, "NPV({r2}) = {higher} not below NPV({r1}) = {lower}");
    }

    #[test]
    fn npv_at_irr_is_zero(
        flows in flows_strategy(),
        investment in 1_000i64..300_000,
    ) {
        let investment = Decimal::from(investment);
        let out = compute_irr(&IrrInput {
            initial_investment: investment,
            cash_flows: flows.clone(),
            reference_rate: Decimal::new(1, 1),
            solver: None,
        })
        .unwrap()
        .result;
        if let Some(irr) = out.irr {
            let npv = project_npv(investment, &flows, irr).unwrap();
            prop_assert!(npv.abs() < Decimal::new(1, 2), "NPV at IRR {irr} = {npv}");
        } else {
            prop_assert_eq!(out.decision, Decision::NotComputable);
        }
    }

    #[test]
    fn wacc_within_component_costs(
        equity in 0i64..10_000_000,
        debt in 0i64..10_000_000,
        re in rate_strategy(5_000),
        rd in rate_strategy(5_000),
        tax in rate_strategy(6_000),
    ) {
        let out = compute_wacc(&WaccInput {
            equity: Decimal::from(equity),
            debt: Decimal::from(debt),
            cost_of_equity: re,
            cost_of_debt: rd,
            tax_rate: tax,
            hurdle_return: None,
            fallback: None,
        })
        .unwrap()
        .result;

        let after_tax = rd * (Decimal::ONE - tax);
        let lo = re.min(after_tax);
        let hi = re.max(rd);
        let eps = Decimal::new(1, 20);
        prop_assert!(out.wacc >= lo - eps && out.wacc <= hi + eps);
        if debt == 0 && equity > 0 {
            prop_assert_eq!(out.wacc, re);
        }
    }

    #[test]
    fn loan_schedule_closes(
        principal in 1_000i64..2_000_000,
        rate in rate_strategy(3_000),
        months in 1u32..480,
    ) {
        let principal = Decimal::from(principal);
        let out = build_loan_schedule(&LoanInput {
            principal,
            annual_rate: rate,
            term_months: months,
        })
        .unwrap()
        .result;

        prop_assert_eq!(out.schedule.len(), months as usize);
        prop_assert_eq!(out.schedule[out.schedule.len() - 1].remaining_balance, Decimal::ZERO);
        let repaid: Decimal = out.schedule.iter().map(|r| r.principal).sum();
        prop_assert!((repaid - principal).abs() < Decimal::new(1, 6));
        prop_assert!(out.schedule.iter().all(|r| r.remaining_balance >= Decimal::ZERO));
    }

    #[test]
    fn default_scenarios_are_ordered(
        flows in flows_strategy(),
        investment in 0i64..500_000,
        rate in rate_strategy(5_000),
    ) {
        let out = analyze_scenarios(&ScenarioAnalysisInput {
            initial_investment: Decimal::from(investment),
            cash_flows: flows,
            discount_rate: rate,
            scenarios: None,
        })
        .unwrap()
        .result;
        prop_assert!(out.optimistic.npv >= out.base.npv);
        prop_assert!(out.base.npv >= out.pessimistic.npv);
    }
}
