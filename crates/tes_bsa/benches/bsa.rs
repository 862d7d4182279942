use divan::AllocProfiler;

#[path = "../tests/common/mod.rs"]
mod common;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

fn get_input() -> Vec<u8> {
    let names = (0..4096)
        .map(|i| format!("meshes\\generated\\mesh_{i:04}.nif"))
        .collect::<Vec<_>>();
    let data = [0xABu8; 512];
    let files = names
        .iter()
        .map(|name| (name.as_str(), &data[..]))
        .collect::<Vec<_>>();
    common::tes3(&files)
}

pub mod read {
    use divan::Bencher;
    use std::io::prelude::*;
    use tes_bsa::BsaArchive;

    use super::get_input;

    #[divan::bench]
    fn open(bencher: Bencher) {
        bencher.with_inputs(get_input).bench_values(|data| {
            divan::black_box(BsaArchive::new(data).unwrap());
        });
    }

    #[divan::bench]
    fn access_file(bencher: Bencher) {
        bencher
            .with_inputs(|| BsaArchive::new(get_input()).unwrap())
            .bench_refs(|bsa| {
                divan::black_box(bsa.by_index(0).unwrap());
            });
    }

    #[divan::bench(sample_count = 1)]
    fn read_file_all(bencher: Bencher) {
        let bsa = BsaArchive::new(get_input()).unwrap();

        bencher.bench_local(move || {
            let mut buffer = Vec::new();
            for i in 0..bsa.len() {
                let mut file = bsa.by_index(i).unwrap();
                file.read_to_end(&mut buffer).unwrap();
                buffer.clear();
            }
        });
    }
}
