//! Retrieval-augmented analysis over indexed motion snapshots.

use kinesis_core::{Embedding, SearchHit, SimilarityStore};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::documents::sample_from_document;
use crate::error::{PipelineError, PipelineResult};
use crate::prompts;
use crate::providers::{Embedder, PromptTemplate, TextGenerator};

/// Embeds `query` and returns the `k` closest stored snapshots.
pub async fn retrieve(
    store: &SimilarityStore,
    embedder: &dyn Embedder,
    query: &str,
    k: usize,
) -> PipelineResult<Vec<SearchHit>> {
    let embedding = Embedding::from(embedder.embed(query).await?);
    let hits = store.search(embedding.view(), k)?;
    debug!(query, hits = hits.len(), "Retrieved motion snapshots");
    Ok(hits)
}

/// Renders hits as numbered "Motion Pattern" blocks. Hits without a sample payload are left out.
pub fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .filter_map(|hit| hit.document.as_ref().and_then(sample_from_document))
        .enumerate()
        .map(|(i, sample)| {
            format!(
                "Motion Pattern {}:\n\
                 - Position: Pitch={:.2}, Roll={:.2}, Yaw={:.2}\n\
                 - Movement: X={:.2}, Y={:.2}, Z={:.2}\n",
                i + 1,
                sample.pos.pitch,
                sample.pos.roll,
                sample.pos.yaw,
                sample.gyro.x,
                sample.gyro.y,
                sample.gyro.z,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Answer produced by [`RagAgent::answer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub analysis: String,
    /// The context block the answer was grounded on.
    pub source_data: String,
}

/// Retrieve, build context, then ask the text generator.
pub struct RagAgent<'a> {
    store: &'a SimilarityStore,
    embedder: &'a dyn Embedder,
    generator: &'a dyn TextGenerator,
    top_k: usize,
    template: PromptTemplate,
}

impl<'a> RagAgent<'a> {
    pub fn new(
        store: &'a SimilarityStore,
        embedder: &'a dyn Embedder,
        generator: &'a dyn TextGenerator,
        top_k: usize,
    ) -> Self {
        RagAgent {
            store,
            embedder,
            generator,
            top_k,
            template: PromptTemplate::new(prompts::RAG_ANALYSIS),
        }
    }

    pub async fn answer(&self, query: &str) -> PipelineResult<Analysis> {
        let hits = retrieve(self.store, self.embedder, query, self.top_k).await?;
        let context = format_context(&hits);
        let values = HashMap::from([("context", context.as_str()), ("query", query)]);
        let prompt = self.template.render(&values)?;
        let analysis = self.generator.generate(&prompt).await?;
        info!(query, patterns = hits.len(), "Answered motion query");
        Ok(Analysis { analysis, source_data: context })
    }
}

/// Several [`Analysis`] results merged into one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub synthesized_analysis: String,
    pub sub_results: Vec<Analysis>,
}

/// Splits broad questions into focused sub-queries and merges their answers.
pub struct QueryPlanner<'a> {
    generator: &'a dyn TextGenerator,
    decompose_template: PromptTemplate,
    synthesize_template: PromptTemplate,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        QueryPlanner {
            generator,
            decompose_template: PromptTemplate::new(prompts::QUERY_PLANNER),
            synthesize_template: PromptTemplate::new(prompts::SYNTHESIS),
        }
    }

    /// Asks the generator for sub-queries. Falls back to `query` itself when
    /// the reply lists none.
    pub async fn decompose(&self, query: &str) -> PipelineResult<Vec<String>> {
        let prompt = self.decompose_template.render(&HashMap::from([("query", query)]))?;
        let reply = self.generator.generate(&prompt).await?;
        let sub_queries = parse_sub_queries(&reply);
        if sub_queries.is_empty() {
            debug!(query, "Planner returned no sub-queries, using the query as is");
            return Ok(vec![query.to_string()]);
        }
        debug!(query, count = sub_queries.len(), "Decomposed query");
        Ok(sub_queries)
    }

    pub async fn synthesize(&self, sub_results: &[Analysis]) -> PipelineResult<Synthesis> {
        if sub_results.is_empty() {
            return Err(PipelineError::InvalidArgument("nothing to synthesize".to_string()));
        }
        let results = sub_results
            .iter()
            .enumerate()
            .map(|(i, result)| format!("Analysis {}:\n{}", i + 1, result.analysis))
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = self.synthesize_template.render(&HashMap::from([("results", results.as_str())]))?;
        let synthesized_analysis = self.generator.generate(&prompt).await?;
        Ok(Synthesis { synthesized_analysis, sub_results: sub_results.to_vec() })
    }

    /// Decomposes `query`, answers every sub-query with `agent`, then merges the answers.
    pub async fn answer(&self, agent: &RagAgent<'_>, query: &str) -> PipelineResult<Synthesis> {
        let mut sub_results = Vec::new();
        for sub_query in self.decompose(query).await? {
            sub_results.push(agent.answer(&sub_query).await?);
        }
        info!(query, sub_queries = sub_results.len(), "Synthesizing planned answer");
        self.synthesize(&sub_results).await
    }
}

/// Numbered items following the "Sub-Queries" heading, up to the next `-` bullet.
fn parse_sub_queries(reply: &str) -> Vec<String> {
    let mut in_section = false;
    let mut sub_queries = Vec::new();
    for line in reply.lines().map(str::trim) {
        if !in_section {
            in_section = line.contains("Sub-Queries");
            continue;
        }
        if line.starts_with('-') {
            break;
        }
        let digits = line.chars().take_while(char::is_ascii_digit).count();
        if digits == 0 {
            continue;
        }
        if let Some(item) = line[digits..].strip_prefix('.') {
            let item = item.trim().trim_start_matches('[').trim_end_matches(']').trim();
            if !item.is_empty() {
                sub_queries.push(item.to_string());
            }
        }
    }
    sub_queries
}
