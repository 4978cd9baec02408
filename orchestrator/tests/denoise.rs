use std::time::Duration;

use orchestrator::{ClusterConfig, Image, OrchestratorError, RunConfig, denoise};
use tokio::{net::TcpListener, time::timeout};
use worker::{bootstrap, service};

const DEADLINE: Duration = Duration::from_secs(30);

/// A 12 by 8 image with a +1 square on a -1 background and a few flipped pixels.
fn noisy_square() -> Image {
    let cells = (0..12)
        .flat_map(|y| (0..8).map(move |x| (y, x)))
        .map(|(y, x)| {
            let inside = (3..9).contains(&y) && (2..6).contains(&x);
            let noise = (y * 8 + x) % 7 == 0;
            if inside != noise { 1 } else { -1 }
        })
        .collect();

    Image::new(8, cells).unwrap()
}

fn local_config(workers: usize, iterations: usize) -> RunConfig {
    let mut config = RunConfig::new("unused", "unused", ClusterConfig::Local { workers });
    config.iterations = iterations;
    config.seed = Some(7);
    config
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn zero_iterations_leave_the_image_untouched() {
    let image = noisy_square();

    // 2 iterations among 3 workers round down to none each.
    let denoised = timeout(DEADLINE, denoise(&image, &local_config(3, 2)))
        .await
        .expect("run timed out")
        .unwrap();

    assert_eq!(denoised.image, image);
    assert_eq!(denoised.reports.len(), 3);
    assert!(denoised.reports.iter().all(|r| r.iterations == 0 && r.flips == 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn local_cluster_denoises_in_band_order() {
    let image = noisy_square();

    let denoised = timeout(DEADLINE, denoise(&image, &local_config(4, 40_000)))
        .await
        .expect("run timed out")
        .unwrap();

    assert_eq!(denoised.image.width(), 8);
    assert_eq!(denoised.image.height(), 12);
    assert!(denoised.image.rows().flatten().all(|&s| s == 1 || s == -1));

    let ranks: Vec<_> = denoised.reports.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, [1, 2, 3, 4]);
    assert!(denoised.reports.iter().all(|r| r.iterations == 10_000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn seeded_local_runs_replay_exactly() {
    let image = noisy_square();
    let config = local_config(2, 5_000);

    let first = timeout(DEADLINE, denoise(&image, &config))
        .await
        .expect("run timed out")
        .unwrap();
    let second = timeout(DEADLINE, denoise(&image, &config))
        .await
        .expect("run timed out")
        .unwrap();

    assert_eq!(first.image, second.image);
    assert_eq!(first.reports, second.reports);
}

#[tokio::test]
async fn uneven_heights_fail_before_connecting() {
    let image = noisy_square();

    // Nothing listens on these, any connection attempt would fail differently.
    let mut config = RunConfig::new(
        "unused",
        "unused",
        ClusterConfig::Remote {
            worker_addrs: vec!["127.0.0.1:1".into(); 5],
        },
    );
    config.iterations = 10;

    let err = denoise(&image, &config).await.unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Indivisible {
            height: 12,
            workers: 5
        }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tcp_workers_chain_through_their_neighbours() {
    let image = noisy_square();
    let mut worker_addrs = Vec::new();
    let mut workers = Vec::new();

    for _ in 0..3 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        worker_addrs.push(listener.local_addr().unwrap().to_string());

        workers.push(tokio::spawn(async move {
            let mut boot = bootstrap::bootstrap(&listener)
                .await?
                .expect("orchestrator disconnected");
            service::serve(&boot.spec, &mut boot.rx, &mut boot.tx, boot.topology).await
        }));
    }

    let mut config = RunConfig::new("unused", "unused", ClusterConfig::Remote { worker_addrs });
    config.iterations = 3_000;
    config.seed = Some(1);

    let denoised = timeout(DEADLINE, denoise(&image, &config))
        .await
        .expect("run timed out")
        .unwrap();

    assert_eq!(denoised.image.height(), 12);
    assert_eq!(denoised.reports.len(), 3);

    for handle in workers {
        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.iterations, 1_000);
    }
}
