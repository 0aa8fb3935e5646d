use criterion::{Criterion, criterion_group, criterion_main};
use repo_core::{EngineConfig, InstallerBridge, Reconciler};
use repo_store::{MemoryRepository, Properties, PropertyValue};
use repo_test_utils::MockInstaller;
use std::hint::black_box;
use std::sync::Arc;

fn populated_repository(folders: usize, per_folder: usize) -> Arc<MemoryRepository> {
    let repository = Arc::new(MemoryRepository::new());
    for f in 0..folders {
        let root = if f % 2 == 0 { "/libs" } else { "/apps" };
        for r in 0..per_folder {
            let folder = format!("{root}/app{f}/install");
            repository
                .write_file(format!("{folder}/bundle{r}.jar"), format!("bundle {f}/{r}").as_bytes())
                .unwrap();
            let mut properties = Properties::new();
            properties.insert("index".into(), PropertyValue::Long(r as i64));
            repository
                .write_config(format!("{folder}/config{r}"), properties)
                .unwrap();
        }
    }
    repository
}

fn benchmark_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    let rules = EngineConfig::default().rules().unwrap();

    group.bench_function("steady_state_1000_resources", |b| {
        let repository = populated_repository(50, 10);
        let bridge = InstallerBridge::new("bench", Arc::new(MockInstaller::new()));
        let mut reconciler = Reconciler::new(repository, rules.clone());
        reconciler.run_cycle(&bridge).unwrap();

        b.iter(|| black_box(reconciler.reconcile().unwrap()));
    });

    group.bench_function("initial_cycle_1000_resources", |b| {
        b.iter_with_setup(
            || {
                let reconciler = Reconciler::new(populated_repository(50, 10), rules.clone());
                let bridge = InstallerBridge::new("bench", Arc::new(MockInstaller::new()));
                (reconciler, bridge)
            },
            |(mut reconciler, bridge)| {
                reconciler.run_cycle(&bridge).unwrap();
            },
        );
    });

    group.finish();
}

criterion_group!(benches, benchmark_reconcile);
criterion_main!(benches);
