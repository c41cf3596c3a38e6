//! Performance benchmarks for ltree

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ltree::file_utils::count_text;
use ltree::probes::{get_audio_duration, get_image_megapixels, get_pdf_page_count};
use ltree::test_utils::{TestRepo, mp4_bytes, pdf_bytes, png_bytes, text_lines, wav_bytes};
use ltree::{BuildOpts, ComputeOpts, Git2Cache, NoGit, TreeBuilder};

fn create_tree(dirs: usize, files_per_dir: usize) -> TestRepo {
    let repo = TestRepo::with_git();
    for d in 0..dirs {
        for f in 0..files_per_dir {
            repo.add_file(&format!("dir_{d}/file_{f}.rs"), &text_lines(20));
        }
    }
    repo.commit("initial");
    repo
}

fn bench_probes(c: &mut Criterion) {
    let repo = TestRepo::new();
    let png = repo.add_bytes("image.png", &png_bytes(4000, 3000));
    let wav = repo.add_bytes("sound.wav", &wav_bytes(176_400, 1_764_000));
    let mp4 = repo.add_bytes("clip.mp4", &mp4_bytes(1000, 90_000));
    let pdf = repo.add_bytes("doc.pdf", &pdf_bytes(120));
    let text = repo.add_file("notes.txt", &text_lines(10));

    let mut group = c.benchmark_group("probes");

    group.bench_function("png", |b| {
        b.iter(|| get_image_megapixels(black_box(&png)))
    });

    group.bench_function("wav", |b| b.iter(|| get_audio_duration(black_box(&wav))));

    group.bench_function("mp4", |b| b.iter(|| get_audio_duration(black_box(&mp4))));

    group.bench_function("pdf", |b| b.iter(|| get_pdf_page_count(black_box(&pdf))));

    // Non-matching input: every probe has to refuse.
    group.bench_function("miss_on_text", |b| {
        b.iter(|| {
            get_image_megapixels(black_box(&text))
                .or_else(|| get_audio_duration(black_box(&text)))
                .or_else(|| get_pdf_page_count(black_box(&text)))
        })
    });

    group.finish();
}

fn bench_line_counter(c: &mut Criterion) {
    let repo = TestRepo::new();
    let small = repo.add_file("small.txt", &text_lines(100));
    let large = repo.add_file("large.txt", &text_lines(50_000));

    let mut group = c.benchmark_group("line_counter");

    group.bench_function("100_lines", |b| b.iter(|| count_text(black_box(&small))));

    group.bench_function("50k_lines", |b| b.iter(|| count_text(black_box(&large))));

    group.finish();
}

fn bench_tree_build(c: &mut Criterion) {
    let repo = create_tree(20, 25);
    let opts = |compute: ComputeOpts| BuildOpts {
        max_depth: None,
        cwd: repo.path().to_path_buf(),
        compute,
        ..BuildOpts::default()
    };

    let mut group = c.benchmark_group("tree_build");

    group.bench_function("500_files_plain", |b| {
        let git = NoGit;
        let builder = TreeBuilder::new(opts(ComputeOpts::none()), &git);
        b.iter(|| builder.build_tree(black_box(repo.path())))
    });

    group.bench_function("500_files_long_no_git", |b| {
        let git = NoGit;
        let mut compute = ComputeOpts::long();
        compute.git_status = false;
        compute.git_diff = false;
        let builder = TreeBuilder::new(opts(compute), &git);
        b.iter(|| builder.build_tree(black_box(repo.path())))
    });

    group.bench_function("500_files_git_status", |b| {
        b.iter(|| {
            let git = Git2Cache::new(false);
            let builder = TreeBuilder::new(opts(ComputeOpts::basic()), &git);
            builder.build_tree(black_box(repo.path()))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_probes, bench_line_counter, bench_tree_build);

criterion_main!(benches);
