pub mod domain;
pub mod error;
pub mod package;
pub mod pipeline;
pub mod ports;
pub mod preview;
pub mod template;

pub use domain::{QuestionDraft, QuizLanguage, QuizRequest, RequestError, VideoReference};
pub use error::{PackageError, QuizError};
pub use package::{
    assemble_package, assemble_package_file, assemble_package_into, clone_question_from_template,
    write_package_atomically,
};
pub use pipeline::{PreparedQuiz, QuizPipeline};
pub use ports::{ContentSource, PortError, PortResult, QuestionGenerator};
pub use template::{ContentDocument, DonorQuestion, GeneratedQuestion, CONTENT_DESCRIPTOR_PATH};
