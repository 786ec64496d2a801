/*
 * @Description  : 共享参数组：多条成员连接引用同一份权重
 */

use crate::assert_err;
use crate::nn::{
    Activatable, ConnectionSpec, FullConnection, GroupId, Layer, NetError, Network, NetworkKind,
};
use approx::assert_abs_diff_eq;

/// 交叉网络：a 的两个分量分别经同一组权重 m1 进入 b、c，
/// b、c 再经同一组权重 m2 交叉写回 d 的两个分量
pub(super) fn crossed_network() -> (Network, GroupId, GroupId) {
    let mut net = Network::with_kind_and_seed("crossed", NetworkKind::FeedForward, 17);
    let a = net.add_input_module(Layer::linear(2, "a")).unwrap();
    let b = net.add_module(Layer::sigmoid(3, "b")).unwrap();
    let c = net.add_module(Layer::sigmoid(3, "c")).unwrap();
    let d = net.add_output_module(Layer::linear(2, "d")).unwrap();
    let m1 = net.new_shared_group("m1", 3).unwrap();
    let m2 = net.new_shared_group("m2", 3).unwrap();

    net.add_connection(ConnectionSpec::shared(m1, FullConnection, a, b).in_slice_to(1))
        .unwrap();
    net.add_connection(ConnectionSpec::shared(m1, FullConnection, a, c).in_slice_from(1))
        .unwrap();
    net.add_connection(ConnectionSpec::shared(m2, FullConnection, b, d).out_slice_from(1))
        .unwrap();
    net.add_connection(ConnectionSpec::shared(m2, FullConnection, c, d).out_slice_to(1))
        .unwrap();
    net.sort_modules().unwrap();
    (net, m1, m2)
}

#[test]
fn test_only_groups_hold_parameters() {
    let (net, _, _) = crossed_network();
    assert_eq!(net.paramdim(), 6);
    let layout = net.param_layout().unwrap();
    assert_eq!(
        layout,
        vec![("group:m1".to_string(), 0..3), ("group:m2".to_string(), 3..6)]
    );
}

#[test]
fn test_crossed_outputs_mirror_each_other() {
    let (mut net, _, _) = crossed_network();
    let forward = net.activate(&[1.0, 2.0]).unwrap();
    let mirrored = net.activate(&[2.0, 1.0]).unwrap();
    assert_abs_diff_eq!(forward[0], mirrored[1], epsilon = 1e-12);
    assert_abs_diff_eq!(forward[1], mirrored[0], epsilon = 1e-12);
}

#[test]
fn test_group_edit_reaches_every_member() {
    let (mut net, m1, m2) = crossed_network();
    let member = net.connection_id("FullConnection_1").unwrap();
    assert_eq!(
        net.connection_params(member).unwrap(),
        net.group_params(m1).unwrap()
    );

    net.group_params_mut(m2).unwrap().fill(0.0);
    assert_eq!(net.activate(&[0.3, -4.0]).unwrap(), vec![0.0, 0.0]);

    net.group_params_mut(m1).unwrap().fill(0.0);
    net.group_params_mut(m2).unwrap().copy_from_slice(&[1.0, 1.0, 1.0]);
    // sigmoid(0) = 0.5，三个分量求和
    assert_eq!(net.activate(&[9.0, -9.0]).unwrap(), vec![1.5, 1.5]);
}

#[test]
fn test_member_connection_cannot_be_written_directly() {
    let (mut net, _, _) = crossed_network();
    let member = net.connection_id("FullConnection_3").unwrap();
    assert_err!(net.connection_params_mut(member), NetError::OwnershipViolation(_));
}

#[test]
fn test_group_dimension_must_match_connection() {
    let mut net = Network::new("net");
    let a = net.add_input_module(Layer::linear(1, "a")).unwrap();
    let b = net.add_output_module(Layer::linear(3, "b")).unwrap();
    let g = net.new_shared_group("g", 2).unwrap();
    assert_err!(
        net.add_connection(ConnectionSpec::shared(g, FullConnection, a, b)),
        NetError::SliceMismatch { connection, .. } if connection == "FullConnection_1"
    );
    assert_err!(net.new_shared_group("empty", 0), NetError::InvalidOperation(_));
    assert_err!(net.new_shared_group("g", 4), NetError::DuplicateName(_));
}

#[test]
fn test_members_accumulate_into_group_derivatives() {
    let (mut net, m1, m2) = crossed_network();
    net.reset_derivatives().unwrap();
    net.activate(&[0.5, -0.5]).unwrap();
    net.back_activate(&[1.0, 1.0]).unwrap();

    let b = net.module_id("b").unwrap();
    let c = net.module_id("c").unwrap();
    let out_b = net.module(b).unwrap().core().buffers().output().row(0).to_vec();
    let out_c = net.module(c).unwrap().core().buffers().output().row(0).to_vec();
    // 两条成员连接的导数相加：e(=1) · (b + c)
    for (k, &d) in net.group_derivs(m2).unwrap().iter().enumerate() {
        assert_abs_diff_eq!(d, out_b[k] + out_c[k], epsilon = 1e-12);
    }
    assert!(net.group_derivs(m1).unwrap().iter().any(|d| *d != 0.0));
}

#[test]
fn test_copy_keeps_sharing() {
    let (mut net, m1, _) = crossed_network();
    let mut copy = net.copy(false);
    copy.group_params_mut(m1).unwrap().copy_from_slice(&[1.0, 2.0, 3.0]);

    let first = copy.connection_id("FullConnection_1").unwrap();
    let second = copy.connection_id("FullConnection_2").unwrap();
    assert_eq!(copy.connection_params(first).unwrap(), &[1.0, 2.0, 3.0]);
    assert_eq!(copy.connection_params(second).unwrap(), &[1.0, 2.0, 3.0]);
    assert_ne!(net.group_params(m1).unwrap(), &[1.0, 2.0, 3.0]);
}
