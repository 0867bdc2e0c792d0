use crate::Cascade::cascade_designer::Cascade;
use crate::Centrifuge::centrifuge_model::{CentrifugeModel, CentrifugeSpec};
use crate::Centrifuge::stage_model::StageModel;
use crate::Utils::task_loader::{CascadeReport, DEFAULT_PERIOD, load_task};

pub fn cascade_examples(task: usize) {
    // 739 kg of natural uranium per month
    let max_feed = 739.0 / DEFAULT_PERIOD;
    match task {
        0 => {
            // separative power of the reference machine and its ideal cut at natural feed
            let model = CentrifugeModel::new(CentrifugeSpec::default()).expect("invalid machine");
            for cut in [0.2, 0.4, 0.5, 0.6, 0.8] {
                let du = model.compute_separative_power(cut).expect("dU failed");
                println!("cut {:.2}: dU = {:.4e} kg-SWU/s", cut, du);
            }
            let stage = StageModel::ideal(model, 0.0071, 1e-12, 100).expect("no ideal cut");
            println!(
                "ideal cut {:.6}, alpha {:.6}, x_p {:.6}, x_w {:.6}",
                stage.cut, stage.alpha, stage.product_assay, stage.tail_assay
            );
        }
        1 => {
            // LEU cascade from natural uranium, machine budget large enough for the full feed
            let cascade = Cascade::construct(
                CentrifugeSpec::default(),
                0.0071,
                0.035,
                0.001,
                max_feed,
                10_000,
            )
            .expect("cascade design failed");
            cascade.pretty_print();
        }
        2 => {
            // budget-limited cascade: the feed is scaled down to fit 80 machines
            let cascade =
                Cascade::construct(CentrifugeSpec::default(), 0.1, 0.2, 0.05, max_feed, 80)
                    .expect("cascade design failed");
            cascade.pretty_print();
            let capacity = cascade.declared_capacity(DEFAULT_PERIOD);
            println!(
                "monthly throughput {:.3} kg, separative capacity {:.3} kg-SWU",
                capacity.throughput, capacity.swu_capacity
            );
        }
        3 => {
            // natural-uranium cascade fed with 20% material
            let cascade = Cascade::construct(
                CentrifugeSpec::default(),
                0.0071,
                0.035,
                0.001,
                max_feed,
                10_000,
            )
            .expect("cascade design failed");
            for u_cut in [false, true] {
                match cascade.compute_assay_with(0.2, 1e-12, u_cut) {
                    Ok(shifted) => {
                        println!("variable cut: {}", u_cut);
                        shifted.pretty_print();
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
        }
        4 => {
            // task read from a JSON file, report written next to it
            match load_task("cascade_task.json").and_then(|task| {
                let cascade = task.run()?;
                cascade.pretty_print();
                CascadeReport::from_cascade(&cascade, task.period).save("cascade_report.json")
            }) {
                Ok(()) => println!("report written to cascade_report.json"),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        _ => {
            println!("no such example: {}", task);
        }
    }
}
