pub(crate) mod model2vec;
pub(crate) mod openai;

pub use model2vec::Model2VecLoader as Model2Vec;
pub use openai::OpenAIEmbeddingModel as OpenAIEmbedding;
