/*
 * @Author       : 老董
 * @Date         : 2026-03-10
 * @Description  : 线性回归：y = 2·x1 - 3·x2 + 1
 *                 网络结构：in(2) -> out(Linear, 1)，bias -> out；全批量梯度下降
 */
use modnet::nn::{
    Activatable, BuildOptions, NetError, Network, Sequence, build_network, total_loss,
};

fn get_data() -> Vec<Sequence> {
    let points = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];
    vec![
        points
            .iter()
            .map(|&(x1, x2)| (vec![x1, x2], vec![2.0 * x1 - 3.0 * x2 + 1.0]))
            .collect(),
    ]
}

/// 一轮全批量梯度下降，返回本轮更新前的损失
fn train_epoch(net: &mut Network, data: &[Sequence], lr: f64) -> Result<f64, NetError> {
    net.reset_derivatives()?;
    let mut loss = 0.0;
    for sample in data.iter().flatten() {
        let (input, target) = sample;
        let output = net.activate(input)?;
        let error: Vec<f64> = output.iter().zip(target).map(|(y, t)| y - t).collect();
        loss += 0.5 * error.iter().map(|e| e * e).sum::<f64>();
        net.back_activate(&error)?;
    }
    let derivs = net.derivs()?.to_vec();
    for (p, d) in net.params_mut()?.iter_mut().zip(derivs) {
        *p -= lr * d;
    }
    Ok(loss)
}

#[test]
fn test_linear_regression() -> Result<(), NetError> {
    let start_time = std::time::Instant::now();
    let data = get_data();

    let mut net = build_network(&[2, 1], &BuildOptions::default().with_seed(7))?;
    assert_eq!(net.paramdim(), 3);
    println!("{}", net);

    let initial_loss = total_loss(&mut net, &data)?;
    for epoch in 0..1000 {
        let loss = train_epoch(&mut net, &data, 0.1)?;
        if epoch % 200 == 0 {
            println!("epoch {:4}：loss = {:.8}", epoch, loss);
        }
    }
    let final_loss = total_loss(&mut net, &data)?;
    println!(
        "初始损失 {:.6}，最终损失 {:.3e}，耗时 {:.2?}",
        initial_loss,
        final_loss,
        start_time.elapsed()
    );

    assert!(final_loss < 1e-6);
    let y = net.activate(&[2.0, 1.0])?;
    assert!((y[0] - 2.0).abs() < 1e-3);
    Ok(())
}
