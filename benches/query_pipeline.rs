//! Benchmarks for template binding, query preparation and prerequisite filtering.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use progreval::design::{CandidateResult, ForbiddenSkillSet, PrerequisiteFilter};
use progreval::graph::{Row, Term, vocab};
use progreval::query::{PreparedQuery, SubstitutionMap, TemplateCatalog, TemplateKind};

fn full_substitutions() -> SubstitutionMap {
    SubstitutionMap::new()
        .bind_node("CONCEPT_URI", &vocab::progreval("Variables"))
        .bind_node("PERFORMANCE_URI", &vocab::progreval("Trazar"))
        .bind_node("AUDIENCE_URI", &vocab::progreval("Secundaria"))
        .bind_node("COMPETENCY_URI", &vocab::progreval("Basico"))
        .bind_node("FORMAT_URI", &vocab::progreval("Seleccion-Multiple"))
}

fn bench_bind(c: &mut Criterion) {
    let catalog = TemplateCatalog::builtin();
    let template = catalog.get(TemplateKind::Activity);
    let map = full_substitutions();

    c.bench_function("bind_activity_template", |bench| {
        bench.iter(|| black_box(template.bind(&map)))
    });
}

fn bench_prepare(c: &mut Criterion) {
    let catalog = TemplateCatalog::builtin();
    let bound = catalog.get(TemplateKind::Activity).bind(&full_substitutions());

    c.bench_function("prepare_activity_query", |bench| {
        bench.iter(|| black_box(PreparedQuery::prepare(&bound)))
    });
}

fn bench_filter(c: &mut Criterion) {
    let skills: Vec<_> = (0..16)
        .map(|i| vocab::progreval(&format!("H_{i}")))
        .collect();
    let forbidden: ForbiddenSkillSet = skills.iter().step_by(2).cloned().collect();
    let candidates: Vec<CandidateResult> = (0..500)
        .map(|i| {
            let exemplar = vocab::progreval(&format!("E{i}"));
            let row = Row::new().with("exemplar", Term::Node(exemplar));
            CandidateResult::from_row(row)
                .with_required_skills([skills[i % 16].clone(), skills[(i * 7) % 16].clone()])
        })
        .collect();

    c.bench_function("filter_500_candidates", |bench| {
        bench.iter(|| {
            let filter = PrerequisiteFilter::new(&forbidden);
            black_box(filter.select_top(candidates.clone(), 3))
        })
    });
}

criterion_group!(benches, bench_bind, bench_prepare, bench_filter);
criterion_main!(benches);
