/*
 * @Description  : 前馈网络的激活与反向传播
 */

use crate::assert_err;
use crate::nn::{
    Activatable, BuildOptions, ConnectionId, ConnectionSpec, Layer, NetError, Network,
    build_network,
};
use approx::assert_abs_diff_eq;

/// a(1) --Full--> b(1)，两者都是线性层
fn single_weight_net(weight: f64) -> (Network, ConnectionId) {
    let mut net = Network::new("net");
    let a = net.add_input_module(Layer::linear(1, "a")).unwrap();
    let b = net.add_output_module(Layer::linear(1, "b")).unwrap();
    let c = net.add_connection(ConnectionSpec::full(a, b)).unwrap();
    net.sort_modules().unwrap();
    net.connection_params_mut(c).unwrap()[0] = weight;
    (net, c)
}

#[test]
fn test_activate_is_deterministic() {
    let options = BuildOptions::default().with_seed(11);
    let mut net = build_network(&[2, 3, 1], &options).unwrap();
    let first = net.activate(&[0.3, -0.7]).unwrap();
    let second = net.activate(&[0.3, -0.7]).unwrap();
    assert_eq!(first, second);
    assert_eq!(net.time(), 1);
}

#[test]
fn test_returned_output_is_a_private_copy() {
    let (mut net, _) = single_weight_net(2.0);
    let mut out = net.activate(&[1.5]).unwrap();
    assert_eq!(out, vec![3.0]);
    out[0] = 100.0;
    assert_eq!(net.core().buffers().output().row(0)[0], 3.0);
    assert_eq!(net.activate(&[1.5]).unwrap(), vec![3.0]);
}

#[test]
fn test_sigmoid_hidden_layer() {
    let mut net = Network::new("net");
    let a = net.add_input_module(Layer::linear(1, "a")).unwrap();
    let b = net.add_output_module(Layer::sigmoid(1, "b")).unwrap();
    let c = net.add_connection(ConnectionSpec::full(a, b)).unwrap();
    net.sort_modules().unwrap();

    net.connection_params_mut(c).unwrap()[0] = 0.0;
    assert_abs_diff_eq!(net.activate(&[5.0]).unwrap()[0], 0.5, epsilon = 1e-12);

    net.connection_params_mut(c).unwrap()[0] = 1.0;
    let expected = 1.0 / (1.0 + (-2.0f64).exp());
    assert_abs_diff_eq!(net.activate(&[2.0]).unwrap()[0], expected, epsilon = 1e-12);
}

#[test]
fn test_input_length_is_checked() {
    let options = BuildOptions::default().with_seed(1);
    let mut net = build_network(&[2, 3, 1], &options).unwrap();
    assert_err!(net.activate(&[1.0, 2.0, 3.0]), NetError::DimensionMismatch(2, 3));
    net.activate(&[1.0, 2.0]).unwrap();
    assert_err!(net.back_activate(&[1.0, 1.0]), NetError::DimensionMismatch(1, 2));
}

#[test]
fn test_backward_accumulates_derivatives() {
    let (mut net, c) = single_weight_net(3.0);
    net.activate(&[2.0]).unwrap();
    let inerr = net.back_activate(&[1.0]).unwrap();
    assert_eq!(inerr, vec![3.0]);
    assert_eq!(net.connection_derivs(c).unwrap(), &[2.0]);

    net.activate(&[-0.5]).unwrap();
    net.back_activate(&[2.0]).unwrap();
    assert_eq!(net.connection_derivs(c).unwrap(), &[1.0]);

    net.reset_derivatives().unwrap();
    assert_eq!(net.derivs().unwrap(), &[0.0]);
}

#[test]
fn test_backward_needs_a_matching_forward() {
    let (mut net, _) = single_weight_net(1.0);
    assert_err!(net.back_activate(&[1.0]), NetError::BackwardWithoutForward("net"));

    net.activate(&[1.0]).unwrap();
    net.back_activate(&[1.0]).unwrap();
    assert_err!(net.back_activate(&[1.0]), NetError::BackwardWithoutForward("net"));
}

#[test]
fn test_multiple_inputs_and_outputs_follow_marking_order() {
    let mut net = Network::new("net");
    let a = net.add_input_module(Layer::linear(1, "a")).unwrap();
    let b = net.add_input_module(Layer::linear(2, "b")).unwrap();
    let c = net.add_output_module(Layer::linear(2, "c")).unwrap();
    let d = net.add_output_module(Layer::linear(1, "d")).unwrap();
    net.add_connection(ConnectionSpec::identity(a, d)).unwrap();
    net.add_connection(ConnectionSpec::identity(b, c)).unwrap();
    net.sort_modules().unwrap();

    assert_eq!((net.indim(), net.outdim()), (3, 3));
    assert_eq!(net.activate(&[1.0, 2.0, 3.0]).unwrap(), vec![2.0, 3.0, 1.0]);
    assert_eq!(
        net.back_activate(&[10.0, 20.0, 30.0]).unwrap(),
        vec![30.0, 10.0, 20.0]
    );
}

#[test]
fn test_reset_clears_buffers() {
    let (mut net, _) = single_weight_net(2.0);
    net.activate(&[1.0]).unwrap();
    net.reset();
    assert_eq!(net.time(), 0);
    assert_eq!(net.core().buffers().output().row(0)[0], 0.0);
    assert_eq!(net.core().offset(), 0);
}
