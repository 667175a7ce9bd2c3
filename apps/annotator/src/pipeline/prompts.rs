// Prompt constants for the staged annotation pipeline.
// Stage descriptions live here; `tasks.rs` pairs them with the columns they add.

/// Field separator the model must use between columns. Chosen so it can never
/// collide with the tab-separated CoNLL-U target format.
pub const FIELD_DELIMITER: char = '⟶';

/// Schema block sent with every stage and embedded in the initial prompt.
pub const BASE_SCHEMA: &str = "Each row must have exactly 8 fields in the order:
ID⟶FORM⟶LEMMA⟶UPOS⟶FEATS⟶HEAD⟶DEPREL⟶DEPS
Do not include XPOS or MISC. Use \"⟶\" (not spaces, not tabs) as the separator.
";

/// Initial prompt template. Replace `{sentence}`, `{words}` and `{schema}`.
pub const INITIAL_PROMPT_TEMPLATE: &str = "We will perform dependency parsing on this Swedish sentence:
{sentence}

Words: {words}

{schema}
";

/// Stage instructions template. Replace `{schema}` and `{task}`.
pub const STAGE_INSTRUCTIONS_TEMPLATE: &str = "{schema}\nNow perform:\n{task}";

pub const TASK_LEXICAL: &str = "- Task 1\nAssign ID, FORM, LEMMA, UPOS.";

pub const TASK_FEATS: &str = "- Task 2\nAdd FEATS. If none, use _. \
Use the Universal Dependencies morphological features inventory. \
Each feature must be an attribute=value pair (e.g. Gender=Com, Number=Sing, Case=Nom). \
Multiple features are separated by | and sorted alphabetically by attribute. \
Here is an example from Swedish UD:
3⟶han⟶han⟶PRON⟶-⟶Case=Nom|Definite=Def|Gender=Com|Number=Sing
4⟶elva⟶elva⟶NUM⟶-⟶Case=Nom|NumType=Card
5⟶år⟶år⟶NOUN⟶-⟶Case=Nom|Definite=Ind|Gender=Neut|Number=Plur
Follow this format exactly.";

pub const TASK_HEAD: &str = "- Task 3\nAdd HEAD. For main predicate use 0.";

pub const TASK_DEPREL: &str = "- Task 4\nAdd DEPREL.";

pub const TASK_DEPS: &str = "- Task 5\nAdd DEPS. If none, use _.";
