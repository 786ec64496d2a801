/*
 * @Description  : 数值梯度校验：解析导数与中心差分一致
 */

use super::nested::nested_network;
use super::shared_params::crossed_network;
use crate::nn::{
    BuildOptions, ConnectionSpec, GradientReport, Layer, Network, NetworkKind, Sequence, TanhLayer,
    build_network, check_gradient,
};

const EPSILON: f64 = 1e-6;
const TOLERANCE: f64 = 1e-4;

fn assert_gradient_ok(report: &GradientReport) {
    assert!(
        report.is_ok(TOLERANCE),
        "梯度校验失败：最大误差 {}，出现在 {:?}",
        report.max_error(),
        report.worst_component()
    );
}

fn samples(pairs: &[(&[f64], &[f64])]) -> Sequence {
    pairs
        .iter()
        .map(|(x, y)| (x.to_vec(), y.to_vec()))
        .collect()
}

#[test]
fn test_feedforward_gradient() {
    let options = BuildOptions::default().with_seed(1).with_hidden(TanhLayer);
    let mut net = build_network(&[2, 3, 2], &options).unwrap();
    let data = vec![samples(&[
        (&[0.1, 0.9], &[1.0, 0.0]),
        (&[-0.4, 0.3], &[0.0, 1.0]),
        (&[0.8, -0.7], &[0.5, 0.5]),
    ])];

    let params_before = net.params().unwrap().to_vec();
    let report = check_gradient(&mut net, &data, EPSILON).unwrap();
    assert_gradient_ok(&report);
    assert_eq!(net.params().unwrap(), params_before.as_slice());
    assert_eq!(net.derivs().unwrap(), report.analytic.as_slice());
    assert_eq!(report.layout.len(), 4);
}

#[test]
fn test_recurrent_gradient() {
    let options = BuildOptions::default()
        .with_seed(2)
        .with_recurrent_hidden(true);
    let mut net = build_network(&[2, 3, 1], &options).unwrap();
    let data = vec![
        samples(&[
            (&[0.5, -0.5], &[0.2]),
            (&[0.1, 0.3], &[-0.4]),
            (&[-0.9, 0.0], &[0.7]),
            (&[0.2, 0.2], &[0.0]),
        ]),
        samples(&[(&[1.0, 1.0], &[1.0]), (&[-1.0, 0.5], &[0.0])]),
    ];
    let report = check_gradient(&mut net, &data, EPSILON).unwrap();
    assert_gradient_ok(&report);
}

#[test]
fn test_shared_parameter_gradient() {
    let (mut net, _, _) = crossed_network();
    let data = vec![samples(&[
        (&[1.0, 2.0], &[0.5, -0.5]),
        (&[-0.3, 0.6], &[1.0, 1.0]),
    ])];
    let report = check_gradient(&mut net, &data, EPSILON).unwrap();
    assert_gradient_ok(&report);
}

#[test]
fn test_nested_network_gradient() {
    let (mut net, _) = nested_network();
    let data = vec![samples(&[
        (&[0.5], &[0.1]),
        (&[-1.0], &[0.3]),
        (&[0.25], &[-0.2]),
    ])];
    let report = check_gradient(&mut net, &data, EPSILON).unwrap();
    assert_gradient_ok(&report);
}

#[test]
fn test_subsampling_and_shift_gradient() {
    let mut net = Network::with_kind_and_seed("net", NetworkKind::FeedForward, 5);
    let a = net.add_input_module(Layer::linear(4, "a")).unwrap();
    let s = net.add_module(Layer::shift(2, "s")).unwrap();
    let t = net.add_output_module(Layer::tanh(1, "t")).unwrap();
    net.add_connection(ConnectionSpec::subsampling(a, s)).unwrap();
    net.add_connection(ConnectionSpec::full(s, t)).unwrap();
    net.sort_modules().unwrap();
    net.randomize(0.5).unwrap();

    let data = vec![samples(&[
        (&[0.1, 0.2, 0.3, 0.4], &[0.5]),
        (&[-1.0, 0.5, 0.0, 2.0], &[-0.5]),
    ])];
    let report = check_gradient(&mut net, &data, EPSILON).unwrap();
    assert_gradient_ok(&report);
    assert_eq!(report.analytic.len(), 2 + 2 + 2);
}

#[test]
fn test_linear_connection_gradient() {
    let mut net = Network::with_kind_and_seed("net", NetworkKind::FeedForward, 6);
    let a = net.add_input_module(Layer::linear(3, "a")).unwrap();
    let b = net.add_module(Layer::sigmoid(3, "b")).unwrap();
    let c = net.add_output_module(Layer::linear(1, "c")).unwrap();
    net.add_connection(ConnectionSpec::linear(a, b)).unwrap();
    net.add_connection(ConnectionSpec::full(b, c)).unwrap();
    net.sort_modules().unwrap();

    let data = vec![samples(&[(&[1.0, -2.0, 0.5], &[0.3])])];
    let report = check_gradient(&mut net, &data, EPSILON).unwrap();
    assert_gradient_ok(&report);
}

#[test]
fn test_worst_component_is_reported() {
    let report = GradientReport {
        analytic: vec![1.0, 2.0, 3.0],
        numeric: vec![1.0, 2.5, 3.0],
        layout: vec![
            ("connection:w".to_string(), 0..1),
            ("group:g".to_string(), 1..3),
        ],
    };
    assert_eq!(report.worst_component(), Some("group:g"));
    assert!((report.max_error() - 0.2).abs() < 1e-12);
    assert!(!report.is_ok(0.1));
}
