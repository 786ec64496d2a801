/*
 * @Description  : 时间索引缓冲区的扩容、清零与移位
 */

use crate::nn::{Activatable, Buffer, Layer, ModuleBuffers, Network};
use ndarray::{arr1, s};

#[test]
fn test_grow_preserves_rows_and_doubles_capacity() {
    let mut buf = Buffer::new(2, 3);
    buf.row_mut(0).assign(&arr1(&[1.0, 2.0, 3.0]));
    buf.row_mut(1).assign(&arr1(&[4.0, 5.0, 6.0]));
    let before = buf.as_array().clone();

    buf.grow();

    assert_eq!(buf.capacity(), 4);
    assert_eq!(buf.dim(), 3);
    assert_eq!(buf.as_array().slice(s![..2, ..]), before);
    assert!(buf.as_array().slice(s![2.., ..]).iter().all(|&x| x == 0.0));
}

#[test]
fn test_grow_from_zero_rows() {
    let mut buf = Buffer::new(0, 2);
    buf.grow();
    assert_eq!(buf.capacity(), 1);
    buf.grow();
    assert_eq!(buf.capacity(), 2);
}

#[test]
fn test_zero_keeps_capacity() {
    let mut buf = Buffer::new(1, 2);
    buf.grow();
    buf.grow();
    buf.row_mut(3).fill(7.0);
    buf.zero();
    assert_eq!(buf.capacity(), 4);
    assert!(buf.as_array().iter().all(|&x| x == 0.0));
}

#[test]
fn test_shift_left_moves_rows_up() {
    let mut buf = Buffer::new(3, 1);
    buf.row_mut(0).fill(1.0);
    buf.row_mut(1).fill(2.0);
    buf.row_mut(2).fill(3.0);

    buf.shift_left();

    assert_eq!(buf.row(0)[0], 2.0);
    assert_eq!(buf.row(1)[0], 3.0);
    assert_eq!(buf.row(2)[0], 0.0);
}

#[test]
fn test_slice_views_a_row_segment() {
    let mut buf = Buffer::new(2, 4);
    buf.row_mut(1).assign(&arr1(&[1.0, 2.0, 3.0, 4.0]));
    assert_eq!(buf.slice(1, 1..3), arr1(&[2.0, 3.0]));
    buf.slice_mut(1, 0..2).fill(9.0);
    assert_eq!(buf.row(1), arr1(&[9.0, 9.0, 3.0, 4.0]));
}

#[test]
fn test_extra_buffers_follow_standard_buffers() {
    let mut buffers = ModuleBuffers::new(2, 3, 1);
    buffers.declare("state", 4);
    assert_eq!(buffers.extra("state").unwrap().dim(), 4);
    assert!(buffers.extra("missing").is_none());

    buffers.grow();
    buffers.grow();
    assert_eq!(buffers.capacity(), 4);
    assert_eq!(buffers.output().capacity(), 4);
    assert_eq!(buffers.extra("state").unwrap().capacity(), 4);

    buffers.extra_mut("state").unwrap().row_mut(2).fill(1.0);
    buffers.zero();
    assert!(
        buffers
            .extra("state")
            .unwrap()
            .as_array()
            .iter()
            .all(|&x| x == 0.0)
    );

    buffers.resize(1);
    assert_eq!(buffers.extra("state").unwrap().capacity(), 1);
    assert_eq!(buffers.extra_names().collect::<Vec<_>>(), vec!["state"]);
}

#[test]
fn test_network_grows_and_resets_all_buffers() {
    let mut net = Network::recurrent("rnn");
    let id = net.add_input_module(Layer::linear(1, "x")).unwrap();
    net.mark_output_module(id).unwrap();
    net.sort_modules().unwrap();
    for x in 1..=3 {
        net.activate(&[x as f64]).unwrap();
    }
    assert_eq!(net.core().buffers().capacity(), 4);

    net.grow_buffers();
    assert_eq!(net.core().buffers().capacity(), 8);
    assert_eq!(net.module(id).unwrap().core().buffers().capacity(), 8);
    assert_eq!(net.core().buffers().output().row(2), arr1(&[3.0]));

    net.reset_buffers(2);
    assert_eq!(net.time(), 0);
    assert_eq!(net.core().buffers().capacity(), 2);
    assert_eq!(net.module(id).unwrap().core().buffers().capacity(), 2);
    assert!(net.core().buffers().output().as_array().iter().all(|&x| x == 0.0));
    assert_eq!(net.activate(&[5.0]).unwrap(), vec![5.0]);
}
