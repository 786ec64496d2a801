/*
 * @Description  : 扁平参数数组：布局、切片可见性、整体读写与随机化
 */

use crate::assert_err;
use crate::nn::{
    Activatable, BuildOptions, ConnectionSpec, Layer, NetError, Network, build_network,
};

fn default_net(seed: u64) -> Network {
    build_network(&[2, 3, 1], &BuildOptions::default().with_seed(seed)).unwrap()
}

#[test]
fn test_paramdim_counts_every_connection() {
    let net = default_net(1);
    // bias->out 1，bias->hidden0 3，in->hidden0 6，hidden0->out 3
    assert_eq!(net.paramdim(), 13);
    assert_eq!(net.params().unwrap().len(), 13);
    assert_eq!(net.derivs().unwrap().len(), 13);
}

#[test]
fn test_layout_follows_sorted_order() {
    let net = default_net(1);
    let layout = net.param_layout().unwrap();
    let expected = vec![
        ("connection:FullConnection_1".to_string(), 0..1),
        ("connection:FullConnection_2".to_string(), 1..4),
        ("connection:FullConnection_3".to_string(), 4..10),
        ("connection:FullConnection_4".to_string(), 10..13),
    ];
    assert_eq!(layout, expected);
}

#[test]
fn test_flat_array_and_slices_share_storage() {
    let mut net = default_net(2);
    let in_hidden = net.connection_id("FullConnection_3").unwrap();
    let hidden_out = net.connection_id("FullConnection_4").unwrap();

    net.params_mut().unwrap()[4] = 7.0;
    assert_eq!(net.connection_params(in_hidden).unwrap()[0], 7.0);

    net.connection_params_mut(hidden_out).unwrap()[2] = -2.0;
    assert_eq!(net.params().unwrap()[12], -2.0);

    let values: Vec<f64> = (0..13).map(f64::from).collect();
    net.set_parameters(&values).unwrap();
    assert_eq!(net.connection_params(hidden_out).unwrap(), &[10.0, 11.0, 12.0]);
}

#[test]
fn test_layer_parameters_join_the_flat_array() {
    let mut net = Network::new("net");
    let a = net.add_input_module(Layer::linear(2, "a")).unwrap();
    let mut shift = Layer::shift(2, "s");
    shift.set_parameters(&[0.5, -0.5]).unwrap();
    let s = net.add_output_module(shift).unwrap();
    net.add_connection(ConnectionSpec::identity(a, s)).unwrap();
    net.sort_modules().unwrap();

    assert_eq!(net.params().unwrap(), &[0.5, -0.5]);
    assert_eq!(net.module_params(s).unwrap(), &[0.5, -0.5]);
    assert_eq!(net.activate(&[1.0, 1.0]).unwrap(), vec![1.5, 0.5]);

    net.module_params_mut(s).unwrap()[1] = 3.0;
    assert_eq!(net.activate(&[1.0, 1.0]).unwrap(), vec![1.5, 4.0]);

    // 嵌入后层不再拥有参数
    let layer = net.module(s).unwrap().as_layer().unwrap();
    assert!(layer.params().is_none());
    assert!(layer.core().is_embedded());
}

#[test]
fn test_parameters_survive_resorting() {
    let mut net = default_net(3);
    let before = net.params().unwrap().to_vec();
    let out = net.module_id("out").unwrap();
    let extra = net.add_module(Layer::linear(1, "extra")).unwrap();
    net.add_connection(ConnectionSpec::identity(out, extra).named("zz"))
        .unwrap();
    net.sort_modules().unwrap();
    assert_eq!(net.params().unwrap(), before.as_slice());
}

#[test]
fn test_set_parameters_checks_length() {
    let mut net = default_net(4);
    assert_err!(net.set_parameters(&[1.0, 2.0]), NetError::DimensionMismatch(13, 2));
}

#[test]
fn test_slices_need_sorting() {
    let mut net = Network::new("net");
    let a = net.add_input_module(Layer::linear(1, "a")).unwrap();
    let b = net.add_output_module(Layer::linear(1, "b")).unwrap();
    let c = net.add_connection(ConnectionSpec::full(a, b)).unwrap();
    assert!(net.params().unwrap().is_empty());
    assert_err!(net.connection_params(c), NetError::NotSorted("net"));
    assert_err!(net.set_parameters(&[1.0]), NetError::NotSorted("net"));
    assert_err!(net.param_layout(), NetError::NotSorted("net"));
}

#[test]
fn test_embedded_network_cannot_be_driven_directly() {
    let inner = default_net(5);
    let mut outer = Network::new("outer");
    let id = outer.add_input_module(inner).unwrap();
    outer.mark_output_module(id).unwrap();
    outer.sort_modules().unwrap();
    assert_eq!(outer.paramdim(), 13);

    let mut embedded = outer.module(id).unwrap().as_network().unwrap().clone();
    assert!(embedded.core().is_embedded());
    assert_err!(embedded.params(), NetError::OwnershipViolation(_));
    assert_err!(embedded.activate(&[0.0, 0.0]), NetError::OwnershipViolation(_));
    assert_err!(embedded.sort_modules(), NetError::OwnershipViolation(_));

    let mut other = Network::new("other");
    assert_err!(other.add_module(embedded), NetError::OwnershipViolation(_));
}

#[test]
fn test_seeded_mutation_is_reproducible() {
    let mut first = default_net(6);
    let mut second = default_net(6);
    assert_eq!(first.params().unwrap(), second.params().unwrap());

    let before = first.params().unwrap().to_vec();
    first.mutate(0.1).unwrap();
    second.mutate(0.1).unwrap();
    assert_eq!(first.params().unwrap(), second.params().unwrap());
    assert_ne!(first.params().unwrap(), before.as_slice());

    first.randomize(1.0).unwrap();
    second.randomize(1.0).unwrap();
    assert_eq!(first.params().unwrap(), second.params().unwrap());
}

#[test]
fn test_invalid_standard_deviation() {
    let mut net = default_net(7);
    assert_err!(net.randomize(-1.0), NetError::InvalidOperation(_));
    assert_err!(net.mutate(f64::NAN), NetError::InvalidOperation(_));

    let before = net.params().unwrap().to_vec();
    assert_err!(net.mutate(-0.1), NetError::InvalidOperation(_));
    assert_err!(net.randomize(f64::INFINITY), NetError::InvalidOperation(_));
    assert_eq!(net.params().unwrap(), before.as_slice());
}

#[test]
fn test_copy_is_independent() {
    let mut net = default_net(8);
    net.activate(&[1.0, 1.0]).unwrap();
    let mut copy = net.copy(false);
    assert_eq!(copy.time(), 0);
    assert_eq!(copy.params().unwrap(), net.params().unwrap());

    copy.params_mut().unwrap()[0] += 1.0;
    assert_ne!(copy.params().unwrap(), net.params().unwrap());

    let kept = net.copy(true);
    assert_eq!(kept.time(), 1);
    assert_eq!(kept.core().buffers(), net.core().buffers());
}

#[test]
fn test_copies_of_seeded_net_mutate_differently() {
    let mut net = default_net(3);
    let mut first = net.copy(false);
    let mut second = net.copy(false);
    first.mutate(0.1).unwrap();
    second.mutate(0.1).unwrap();
    assert_ne!(first.params().unwrap(), second.params().unwrap());

    // 同一种子下派生出的副本序列可复现
    let mut again = default_net(3);
    let mut replay = again.copy(false);
    replay.mutate(0.1).unwrap();
    assert_eq!(replay.params().unwrap(), first.params().unwrap());
}
