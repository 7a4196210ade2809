use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use biofusion::source::RelationshipRecord;
use biofusion::value::attributes;
use biofusion::{Entity, EntityKind, FusionPipeline, IdentityResolver, RelationLabel, SourceGraph};

const GENES: u32 = 2_000;

/// Two overlapping gene catalogs plus a drug source targeting them.
///
/// Every HGNC record has an Entrez twin in the second source, and every
/// target relationship is emitted twice so deduplication has work to do.
fn make_sources() -> Vec<SourceGraph> {
    let hgnc = SourceGraph {
        entities: (0..GENES)
            .map(|n| Entity::new(EntityKind::Gene, [format!("HGNC:{n}")], [format!("G{n}")]).unwrap())
            .collect(),
        relationships: vec![],
    };
    let ncbi = SourceGraph {
        entities: (0..GENES)
            .map(|n| {
                Entity::new(
                    EntityKind::Gene,
                    [format!("HGNC:{n}"), format!("Entrez:{}", n + 10_000)],
                    Vec::<String>::new(),
                )
                .unwrap()
            })
            .collect(),
        relationships: vec![],
    };

    let mut entities = Vec::new();
    let mut relationships = Vec::new();
    for n in 0..GENES / 4 {
        entities.push(Entity::new(EntityKind::Drug, [format!("DrugBank:DB{n:05}")], Vec::<String>::new()).unwrap());
        for target in [format!("HGNC:{n}"), format!("Entrez:{}", n + 10_000)] {
            relationships.push(RelationshipRecord::new(
                RelationLabel::Targets,
                format!("DrugBank:DB{n:05}"),
                target,
                attributes([("source", "DrugBank".into()), ("known_action", true.into())]),
            ));
        }
    }
    let drugbank = SourceGraph {
        entities,
        relationships,
    };

    vec![hgnc, ncbi, drugbank]
}

fn bench_resolver_insert(c: &mut Criterion) {
    let sources = make_sources();
    let records: Vec<Entity> = sources[..2]
        .iter()
        .flat_map(|s| s.entities.iter().cloned())
        .collect();

    let mut group = c.benchmark_group("resolver");
    group.throughput(Throughput::Elements(records.len() as u64));
    group.bench_function("insert_with_merges", |b| {
        b.iter_batched(
            || records.clone(),
            |records| {
                let mut resolver = IdentityResolver::new();
                for record in records {
                    resolver.insert(record);
                }
                black_box(resolver.len())
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_pipeline_run(c: &mut Criterion) {
    let sources = make_sources();

    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);
    group.bench_function("run_without_mapping", |b| {
        b.iter(|| {
            let mut pipeline = FusionPipeline::new();
            let report = pipeline.run(black_box(&sources), None).unwrap();
            black_box(report.final_relationships)
        });
    });
    group.finish();
}

criterion_group!(fusion, bench_resolver_insert, bench_pipeline_run);
criterion_main!(fusion);
