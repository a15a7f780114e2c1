use form_error::Error;
use form_expr::{Argument, Coefficient, Expr, ExprKind, Index, Label, LabelAllocator};
use form_split::{
    error::{
        DependencyArityMismatch,
        ExpressionTooDeep,
        MalformedRenumbering,
        UnknownBasisFunction,
        UnknownCoefficient,
        UnprocessedVariable,
    },
    split_all,
    split_by_dependencies,
    split_by_dependencies_with,
    CodeStructure,
    DependencySet,
    DependencySplitter,
    FormData,
    SplitOptions,
    VariableInfo,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn v(number: usize) -> Expr {
    Expr::basis_function(Argument::scalar(number))
}

fn w() -> Expr {
    Expr::coefficient(Coefficient::new(0, "w", vec![]))
}

/// Splits with the conservative dependency declarations of the form data collected from `expr`.
fn split(expr: &Expr) -> Result<(VariableInfo, CodeStructure), Error> {
    split_with(expr, SplitOptions::default())
}

fn split_with(expr: &Expr, options: SplitOptions) -> Result<(VariableInfo, CodeStructure), Error> {
    let data = FormData::collect(expr);
    split_by_dependencies_with(
        expr,
        &data,
        &data.default_basis_function_deps(),
        &data.default_function_deps(),
        options,
    )
}

/// Renders the error report without colors.
fn report(err: &Error, input: &str) -> String {
    let mut buf = Vec::new();
    err.write_report("integrand", input, &mut buf).unwrap();
    String::from_utf8(strip_ansi_escapes::strip(buf)).unwrap()
}

/// Checks that every variable is in the stack of its own dependency set, exactly once.
fn assert_grouped(code: &CodeStructure) {
    let mut seen = HashSet::new();
    for (deps, stack) in code.stacks() {
        assert!(!stack.is_empty());
        for info in stack {
            assert_eq!(&info.deps, deps);
            assert!(seen.insert(info.label), "{} is in more than one stack", info.label);
            assert_eq!(code.get(info.label), Some(info));
        }
    }
    assert_eq!(seen.len(), code.len());
}

#[test]
fn constant() {
    let expr = Expr::float(1.23);
    let (root, code) = split_by_dependencies(&expr, &FormData::default(), &[], &[]).unwrap();

    assert_eq!(root.deps, DependencySet::empty(0));
    assert!(root.deps.is_empty());
    assert_eq!(code.len(), 1);
    assert_eq!(code.num_stacks(), 1);
    assert!(Expr::ptr_eq(root.expression(), &expr));
}

#[test]
fn single_dependency() {
    let expr = 1.23 * v(0);
    let data = FormData::collect(&expr);
    let basis_function_deps = data.default_basis_function_deps();
    let (root, code) = split_by_dependencies(&expr, &data, &basis_function_deps, &[]).unwrap();

    assert_eq!(root.deps, basis_function_deps[0]);
    assert_eq!(code.len(), 1);

    // nothing was promoted, so the node is not rebuilt
    assert!(Expr::ptr_eq(root.expression(), &expr));
}

#[test]
fn mixed_dependencies() {
    let expr = (1.23 + w()) * v(1) * v(0);
    let (root, code) = split(&expr).unwrap();

    let runtime = DependencySet::empty(2).with_runtime().with_coordinates();
    let trial = DependencySet::basis_function(2, 1).with_coordinates();
    let test = DependencySet::basis_function(2, 0).with_coordinates();
    assert_eq!(root.deps, &(&runtime | &trial) | &test);
    assert!(code.num_stacks() >= 3);
    assert_grouped(&code);

    // each operand of the products got its own variable
    assert_eq!(code.stack(&runtime).len(), 1);
    assert_eq!(code.stack(&trial).len(), 1);
    assert_eq!(code.stack(&test).len(), 1);
    assert_eq!(code.stack(&(&runtime | &trial)).len(), 1);
    assert_eq!(
        code.to_string(),
        "{runtime, x}:\n  var1 = 1.23 + w\n\n\
         {x, v_1}:\n  var2 = v_1\n\n\
         {runtime, x, v_1}:\n  var3 = var1 * var2\n\n\
         {x, v_0}:\n  var4 = v_0\n\n\
         {runtime, x, v_0, v_1}:\n  var0 = var3 * var4\n",
    );
}

#[test]
fn promoted_parent_is_union() {
    let expr = w() * v(0);
    let (root, code) = split(&expr).unwrap();

    let ops = root.expression().operands();
    let lhs = code.get(ops[0].label().unwrap()).unwrap();
    let rhs = code.get(ops[1].label().unwrap()).unwrap();
    assert_ne!(lhs.label, rhs.label);
    assert_eq!(lhs.expression(), &w());
    assert_eq!(rhs.expression(), &v(0));
    assert_eq!(root.deps, &lhs.deps | &rhs.deps);
    assert!(root.deps.covers(&lhs.deps));
    assert!(root.deps.covers(&rhs.deps));
}

#[test]
fn literals_are_not_promoted() {
    let i = Index::new(0, 2);
    let vector = Expr::basis_function(Argument::new(0, vec![2]));
    let expr = (2.0 * w()) * vector.index([i]) * Expr::int(3);
    let (_, code) = split(&expr).unwrap();

    assert_grouped(&code);
    for info in code.iter() {
        assert!(!matches!(
            info.expression().kind(),
            ExprKind::FloatValue(_) | ExprKind::IntValue(_) | ExprKind::MultiIndex(_),
        ));
    }
}

#[test]
fn splitting_twice() {
    let expr = (1.23 + w()) * v(1) * v(0) + w() * v(0);
    let data = FormData::collect(&expr);
    let basis_function_deps = data.default_basis_function_deps();
    let function_deps = data.default_function_deps();

    let (root, code) = split_by_dependencies(&expr, &data, &basis_function_deps, &function_deps).unwrap();
    let (root_again, code_again) = split_by_dependencies(&root.variable, &data, &basis_function_deps, &function_deps).unwrap();

    assert_eq!(root_again, root);
    assert_eq!(code_again, code);
    assert_eq!(code_again.to_string(), code.to_string());
}

#[test]
fn shared_nodes_are_promoted_once() {
    let shared = w() + 1.0 * w();
    let expr = shared.clone() * v(1) + shared.clone() * v(0);
    let (_, code) = split(&expr).unwrap();

    assert_grouped(&code);
    let runtime = DependencySet::empty(2).with_runtime().with_coordinates();
    let stack = code.stack(&runtime);
    assert_eq!(stack.len(), 1);
    assert!(Expr::ptr_eq(stack[0].expression(), &shared));
}

#[test]
fn existing_variables_keep_their_labels() {
    let mut labels = LabelAllocator::new();
    let inner = Expr::labelled(w() * v(0), &mut labels);
    let expr = inner.clone() * v(1);
    let (root, code) = split(&expr).unwrap();

    assert_grouped(&code);
    let info = code.get(Label::new(0)).unwrap();
    assert_eq!(info.deps, DependencySet::basis_function(2, 0).with_runtime().with_coordinates());
    assert_ne!(root.label, Label::new(0));

    // `var0` is referenced by the root, not duplicated
    let ops = root.expression().operands();
    assert_eq!(ops[0].label(), Some(Label::new(0)));
    assert_eq!(code.len(), 5);
}

#[test]
fn variable_root() {
    let mut labels = LabelAllocator::new();
    labels.reserve(Label::new(6));
    let expr = Expr::labelled(1.23 * v(0), &mut labels);
    let (root, code) = split(&expr).unwrap();

    assert_eq!(root.label, Label::new(7));
    assert_eq!(code.len(), 1);
    assert!(Expr::ptr_eq(&root.variable, &expr));
}

#[test]
fn derivatives_depend_on_runtime() {
    let i = Index::new(0, 2);
    let expr = 2.0 * v(0).dx([i]);
    let (root, code) = split(&expr).unwrap();

    assert_eq!(root.deps, DependencySet::basis_function(1, 0).with_coordinates().with_runtime());
    assert_eq!(code.len(), 1);

    let normal = Expr::facet_normal(2).index([0usize]);
    let (root, _) = split(&(normal * v(0))).unwrap();
    assert!(root.deps.runtime());
}

#[test]
fn unknown_basis_function() {
    let expr = 1.23 * v(2);
    let data = FormData::collect(&v(0));
    let basis_function_deps = data.default_basis_function_deps();
    let err = split_by_dependencies(&expr, &data, &basis_function_deps, &[]).unwrap_err();

    let kind = err.downcast_ref::<UnknownBasisFunction>().unwrap();
    assert_eq!(kind.name, "v_2");
    assert_eq!(kind.rank, 1);
    assert_eq!(err.spans, vec![7..10]);
    assert!(report(&err, &expr.to_string()).contains("the basis function `v_2` is not an argument of this form"));
}

#[test]
fn unknown_coefficient() {
    let kappa = Expr::coefficient(Coefficient::new(0, "kappa", vec![]));
    let kapa = Expr::coefficient(Coefficient::new(1, "kapa", vec![]));
    let data = FormData::collect(&(kappa * v(0)));
    let expr = kapa * v(0);
    let err = split_by_dependencies(
        &expr,
        &data,
        &data.default_basis_function_deps(),
        &data.default_function_deps(),
    ).unwrap_err();

    let kind = err.downcast_ref::<UnknownCoefficient>().unwrap();
    assert_eq!(kind.suggestions, vec!["kappa".to_string()]);
    assert_eq!(err.spans, vec![0..4]);

    let report = report(&err, &expr.to_string());
    assert!(report.contains("the coefficient `kapa` is not a coefficient of this form"));
    assert!(report.contains("did you mean the `kappa` coefficient?"));
}

#[test]
fn arity_mismatch() {
    let data = FormData::collect(&(w() * v(0)));
    let basis_function_deps = data.default_basis_function_deps();
    let function_deps = vec![DependencySet::empty(2).with_runtime()];
    let err = split_by_dependencies(&(w() * v(0)), &data, &basis_function_deps, &function_deps).unwrap_err();

    let kind = err.downcast_ref::<DependencyArityMismatch>().unwrap();
    assert_eq!(kind, &DependencyArityMismatch {
        what: "coefficient",
        slot: 0,
        expected: 1,
        given: 2,
    });
}

#[test]
fn malformed_renumbering() {
    let data = FormData::new(HashMap::from([(Argument::scalar(0), 3)]), HashMap::new());
    let basis_function_deps = vec![DependencySet::basis_function(1, 0)];
    let err = split_by_dependencies(&v(0), &data, &basis_function_deps, &[]).unwrap_err();

    let kind = err.downcast_ref::<MalformedRenumbering>().unwrap();
    assert_eq!(kind.slot, 3);
    assert_eq!(kind.declared, 1);
}

#[test]
fn forward_reference() {
    let data = FormData::collect(&v(0));
    let basis_function_deps = data.default_basis_function_deps();
    let mut splitter = DependencySplitter::new(&data, &basis_function_deps, &[], SplitOptions::default()).unwrap();

    let inner = Expr::variable(2.0 * v(0), Label::new(0));
    let outer = Expr::variable(inner * v(0), Label::new(1));
    let err = splitter.handle(&outer).unwrap_err();
    let kind = err.downcast_ref::<UnprocessedVariable>().unwrap();
    assert_eq!(kind.label, "var0");
}

#[test]
fn too_deep() {
    let mut expr = v(0);
    for _ in 0..100 {
        expr = expr + Expr::float(1.0);
    }

    let err = split_with(&expr, SplitOptions::new().max_depth(50)).unwrap_err();
    assert_eq!(err.downcast_ref::<ExpressionTooDeep>(), Some(&ExpressionTooDeep { max_depth: 50 }));

    assert!(split(&expr).is_ok());
}

#[test]
fn far_too_deep() {
    let mut expr = v(0);
    for _ in 0..200_000 {
        expr = expr + Expr::float(1.0);
    }

    let data = FormData::collect(&v(0));
    let err = split_by_dependencies(&expr, &data, &data.default_basis_function_deps(), &[]).unwrap_err();
    assert!(err.is::<ExpressionTooDeep>());
    assert!(err.spans.is_empty());

    // dropping the chain recurses once per level
    std::mem::forget(expr);
}

#[test]
fn promotion_under_tensor_nodes() {
    let i = Index::new(0, 2);
    let vector = Expr::basis_function(Argument::new(0, vec![2]));
    let product = w() * vector.index([i]);
    let expr = product.as_tensor([i]).index([0usize]);
    let (root, code) = split(&expr).unwrap();
    assert_grouped(&code);

    // the component tensor and the indexing around it are rebuilt over the new product
    let indexed = root.expression();
    assert!(matches!(indexed.kind(), ExprKind::Indexed(_, _)));
    assert!(indexed.shape().is_empty());
    assert!(indexed.free_indices().is_empty());

    let tensor = indexed.operands()[0];
    assert!(matches!(tensor.kind(), ExprKind::ComponentTensor(_, _)));
    assert_eq!(tensor.shape(), &[2]);
    assert!(tensor.free_indices().is_empty());

    let product = tensor.operands()[0];
    assert!(matches!(product.kind(), ExprKind::Product(_, _)));
    assert_eq!(product.free_indices(), &[i]);

    let ops = product.operands();
    let component = code.get(ops[1].label().unwrap()).unwrap();
    assert!(matches!(component.expression().kind(), ExprKind::Indexed(_, _)));
    assert_eq!(component.variable.free_indices(), &[i]);
    assert_eq!(code.get(ops[0].label().unwrap()).unwrap().expression(), &w());
}

#[test]
fn promotion_under_other_operators() {
    let runtime = DependencySet::empty(1).with_runtime().with_coordinates();
    let test = DependencySet::basis_function(1, 0).with_coordinates();

    let division = w() / v(0);
    let power = Expr::power(v(0), w());
    let list = Expr::list_tensor(vec![w(), v(0)]).index([1usize]);
    for expr in [division, power, list] {
        let (root, code) = split(&expr).unwrap();
        assert_grouped(&code);
        assert_eq!(root.deps, &runtime | &test);
        assert_eq!(code.stack(&runtime).len(), 1, "{}", expr);
        assert_eq!(code.stack(&test).len(), 1, "{}", expr);
    }

    let list = Expr::list_tensor(vec![w(), v(0)]);
    let (root, _) = split(&list.index([1usize])).unwrap();
    assert_eq!(root.expression().operands()[0].shape(), &[2]);
}

#[test]
fn which_terminals_are_promoted() {
    let zero = Expr::zero(vec![]);
    let (_, code) = split(&(zero + w() * v(0))).unwrap();
    assert_grouped(&code);
    assert!(code.iter().all(|info| !matches!(info.expression().kind(), ExprKind::Zero(_))));

    let constant = DependencySet::empty(1);
    let identity = Expr::identity(2).index([0usize, 1usize]);
    let symbol = Expr::symbol("c");
    for expr in [identity, symbol] {
        let (_, code) = split(&(expr.clone() * v(0))).unwrap();
        let stack = code.stack(&constant);
        assert_eq!(stack.len(), 1);
        assert!(Expr::ptr_eq(stack[0].expression(), &expr));
    }
}

#[test]
fn batch() {
    let integrands = vec![w() * v(0), 1.23 * v(0), v(0) + v(0)];
    let data = FormData::collect(&Expr::list_tensor(integrands.clone()));
    let basis_function_deps = data.default_basis_function_deps();
    let function_deps = data.default_function_deps();

    let results = split_all(&integrands, &data, &basis_function_deps, &function_deps, &SplitOptions::default());
    assert_eq!(results.len(), integrands.len());
    for (integrand, result) in integrands.iter().zip(results) {
        let (root, code) = result.unwrap();
        let (expected_root, expected_code) = split_by_dependencies(integrand, &data, &basis_function_deps, &function_deps).unwrap();
        assert_eq!(root, expected_root);
        assert_eq!(code, expected_code);
    }
}

fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        Just(v(0)),
        Just(v(1)),
        Just(w()),
        Just(Expr::facet_normal(2).index([0usize])),
        Just(Expr::zero(vec![])),
        Just(Expr::symbol("c")),
        Just(Expr::identity(2).index([0usize, 1usize])),
        (1..10i64).prop_map(Expr::int),
        (0.5..2.0f64).prop_map(Expr::float),
    ];
    leaf.prop_recursive(6, 64, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a + b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a * b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a / b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::power(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::list_tensor(vec![a, b]).index([1usize])),
            inner.clone().prop_map(|a| {
                let i = Index::new(0, 2);
                (a * Expr::facet_normal(2).index([i])).as_tensor([i]).index([0usize])
            }),
            inner.prop_map(|a| a.dx([0usize])),
        ]
    })
}

/// The union of what every leaf of the expression depends on.
fn expected_deps(expr: &Expr, data: &FormData) -> DependencySet {
    let basis_function_deps = data.default_basis_function_deps();
    let function_deps = data.default_function_deps();
    expr.post_order_iter().fold(DependencySet::empty(data.rank()), |acc, node| {
        match node.kind() {
            ExprKind::BasisFunction(arg) => &acc | &basis_function_deps[data.basis_function_slot(arg).unwrap()],
            ExprKind::Function(coeff) => &acc | &function_deps[data.coefficient_slot(coeff).unwrap()],
            ExprKind::FacetNormal(_) | ExprKind::SpatialDerivative(_, _) => acc.with_runtime(),
            _ => acc,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn split_invariants(expr in arb_expr()) {
        let data = FormData::collect(&expr);
        let (root, code) = split(&expr).unwrap();

        assert_grouped(&code);
        prop_assert_eq!(&root.deps, &expected_deps(&expr, &data));
        prop_assert_eq!(code.get(root.label), Some(&root));

        let (root_again, code_again) = split(&root.variable).unwrap();
        prop_assert_eq!(root_again, root);
        prop_assert_eq!(code_again, code);
    }
}
