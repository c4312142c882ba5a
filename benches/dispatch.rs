use std::collections::HashSet;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use http::Method;
use webrpc::coerce::coerce;
use webrpc::dispatch::select;
use webrpc::typed::{ScalarKind, TypeDescriptor};
use webrpc::{
    DetachedResponse, Dispatcher, HandlerDescriptor, ParameterDescriptor, ParameterSet, RawValue,
    Router, Value,
};

fn f64_scalar() -> TypeDescriptor {
    TypeDescriptor::Scalar(ScalarKind::F64)
}

fn leaf(name: &str) -> HandlerDescriptor {
    HandlerDescriptor::new(name, Vec::new(), |_, _| Ok(None))
}

fn clinic_router() -> Router {
    let mut builder = Router::builder();
    builder
        .route(Method::GET, "/pets", leaf("list_pets"))
        .unwrap()
        .route(Method::POST, "/pets", leaf("create_pet"))
        .unwrap()
        .route(Method::GET, "/pets/?", leaf("get_pet"))
        .unwrap()
        .route(Method::GET, "/pets/?/visits", leaf("list_visits"))
        .unwrap()
        .route(Method::GET, "/pets/?/visits/?", leaf("get_visit"))
        .unwrap()
        .route(Method::GET, "/inventory", leaf("inventory"))
        .unwrap();
    builder.build()
}

fn math_router() -> Router {
    let mut builder = Router::builder();
    builder
        .route(
            Method::GET,
            "/math/sum",
            HandlerDescriptor::new(
                "sum_pair",
                vec![
                    ParameterDescriptor::new("a", f64_scalar()),
                    ParameterDescriptor::new("b", f64_scalar()),
                ],
                |_, args| {
                    let a = args.get("a").and_then(Value::as_f64).unwrap_or_default();
                    let b = args.get("b").and_then(Value::as_f64).unwrap_or_default();
                    Ok(Some(Value::Float(a + b)))
                },
            ),
        )
        .unwrap()
        .route(
            Method::GET,
            "/math/sum",
            HandlerDescriptor::new(
                "sum_list",
                vec![ParameterDescriptor::new(
                    "values",
                    TypeDescriptor::list(f64_scalar()),
                )],
                |_, _| Ok(Some(Value::Float(0.0))),
            ),
        )
        .unwrap();
    builder.build()
}

fn bench_resolve(c: &mut Criterion) {
    let router = clinic_router();
    let requests = [
        ("get", "/pets"),
        ("post", "/pets"),
        ("get", "/pets/42"),
        ("get", "/pets/42/visits"),
        ("get", "/pets/42/visits/7"),
        ("get", "/inventory"),
    ];

    c.bench_function("resolve", |b| {
        b.iter(|| {
            for (verb, path) in &requests {
                let matched = router.resolve(verb, path);
                black_box(&matched);
            }
        })
    });
}

fn bench_select(c: &mut Criterion) {
    let router = math_router();
    let matched = router.resolve("get", "/math/sum").unwrap();
    let supplied: HashSet<&str> = ["a", "b"].into_iter().collect();

    c.bench_function("select_overload", |b| {
        b.iter(|| black_box(select(&matched.handlers, &supplied)))
    });
}

fn bench_coerce(c: &mut Criterion) {
    let scalar = TypeDescriptor::Scalar(ScalarKind::I64);
    let list = TypeDescriptor::list(f64_scalar());
    let single = vec![RawValue::Text("420000".to_string())];
    let many: Vec<RawValue> = (0..16).map(|i| RawValue::Text(format!("{i}.5"))).collect();

    c.bench_function("coerce_scalar", |b| {
        b.iter(|| black_box(coerce(Some(single.as_slice()), &scalar)))
    });
    c.bench_function("coerce_list", |b| {
        b.iter(|| black_box(coerce(Some(many.as_slice()), &list)))
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let dispatcher = Dispatcher::new(math_router());

    c.bench_function("dispatch_sum", |b| {
        b.iter(|| {
            let mut params = ParameterSet::new();
            params.insert_text("a", "1.5");
            params.insert_text("b", "2.5");
            black_box(dispatcher.dispatch("get", "/math/sum", params, &DetachedResponse))
        })
    });
}

criterion_group!(
    benches,
    bench_resolve,
    bench_select,
    bench_coerce,
    bench_dispatch
);
criterion_main!(benches);
