use comms::{
    msg::{Command, Direction, Msg, Payload},
    specs::worker::{WorkerReport, WorkerSpec},
};
use tokio::io;

fn spec() -> WorkerSpec {
    WorkerSpec {
        rank: 2,
        workers: 3,
        width: 4,
        rows: 2,
        iterations: 100,
        beta: 0.4,
        pi: 0.2,
        seed: Some(7),
        below: Some("127.0.0.1:50003".parse().unwrap()),
    }
}

#[tokio::test]
async fn send_recv_rows() {
    const SIZE: usize = 128;

    let (one, two) = io::duplex(SIZE);
    let (rx, tx) = io::split(one);
    let (_, mut tx) = comms::channel(rx, tx);

    let (peer_rx, peer_tx) = io::split(two);
    let (mut rx, _) = comms::channel(peer_rx, peer_tx);

    let rows = [[1, -1, -1, 1], [-1, -1, 1, 1]];
    let sender = async move {
        let sent = tx.send_rows(rows.iter().map(|row| row.as_slice())).await.unwrap();
        assert_eq!(sent, rows.len());

        tx.send(&Msg::Data(Payload::Halo(Direction::Upward, &rows[0])))
            .await
            .unwrap();
    };

    let receiver = async move {
        let mut buf: Vec<u32> = Vec::new();

        for expected in &rows {
            match rx.recv_into(&mut buf).await.unwrap() {
                Msg::Data(Payload::Row(row)) => assert_eq!(row, expected),
                other => panic!("unexpected msg: {other:?}"),
            }
        }

        match rx.recv_into(&mut buf).await.unwrap() {
            Msg::Data(Payload::Halo(Direction::Upward, row)) => assert_eq!(row, rows[0]),
            other => panic!("unexpected msg: {other:?}"),
        }
    };

    tokio::join!(sender, receiver);
}

#[tokio::test]
async fn send_recv_control() {
    const SIZE: usize = 1024;

    let (one, two) = io::duplex(SIZE);
    let (rx, tx) = io::split(one);
    let (_, mut tx) = comms::channel(rx, tx);

    let (peer_rx, peer_tx) = io::split(two);
    let (mut rx, _) = comms::channel(peer_rx, peer_tx);

    let report = WorkerReport {
        rank: 2,
        iterations: 100,
        flips: 13,
    };

    tx.send(&Msg::Control(Command::CreateWorker(spec())))
        .await
        .unwrap();
    tx.send(&Msg::Control(Command::Report(report))).await.unwrap();
    tx.send(&Msg::Err("worker 2 failed".into())).await.unwrap();

    let mut buf: Vec<u32> = Vec::new();

    match rx.recv_into(&mut buf).await.unwrap() {
        Msg::Control(Command::CreateWorker(got)) => assert_eq!(got, spec()),
        other => panic!("unexpected msg: {other:?}"),
    }

    match rx.recv_into(&mut buf).await.unwrap() {
        Msg::Control(Command::Report(got)) => assert_eq!(got, report),
        other => panic!("unexpected msg: {other:?}"),
    }

    match rx.recv_into(&mut buf).await.unwrap() {
        Msg::Err(detail) => assert_eq!(detail, "worker 2 failed"),
        other => panic!("unexpected msg: {other:?}"),
    }
}

#[test]
fn flip_percentage_of_an_idle_worker_is_zero() {
    let report = WorkerReport {
        rank: 1,
        iterations: 0,
        flips: 0,
    };

    assert_eq!(report.flip_percentage(), 0.);
}
