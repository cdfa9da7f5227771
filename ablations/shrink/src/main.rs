//! 内部 ROI 收缩策略的消融实验: 在合成模体上比较距离变换与质心半径两种策略.

mod algos;
mod result;
mod runner;

fn main() -> std::io::Result<()> {
    if let Err(e) = simple_logger::init_with_level(log::Level::Info) {
        eprintln!("logger: {e}");
    }
    runner::run().analyze()
}
