use crate::constituents::{ConstituentMode, CTree};
use crate::error::{Error, LinkageError, NoLinkagesError};
use crate::linkage::{Link, Linkage};

type Delegated<T> = Result<T, NoLinkagesError>;

/// Linkage queries answered by something that has a linkage to answer them
/// with. [`Linkage`] answers them itself; a sentence hands them to its first
/// linkage and fails with [`NoLinkagesError`] when it has none.
pub trait LinkageAccessors {
    fn with_linkage<R>(&self, f: impl FnOnce(&Linkage) -> R) -> Delegated<R>;

    fn with_linkage_mut<R>(&mut self, f: impl FnOnce(&mut Linkage) -> R) -> Delegated<R>;

    fn linkage_words(&self) -> Delegated<Vec<String>> {
        self.with_linkage(|l| l.words().to_vec())
    }

    fn num_words(&self) -> Delegated<usize> {
        self.with_linkage(Linkage::num_words)
    }

    fn num_links(&self) -> Delegated<usize> {
        self.with_linkage(Linkage::num_links)
    }

    fn link(&self, index: usize) -> Delegated<Link> {
        self.with_linkage(|l| Linkage::link(l, index))
    }

    fn links(&self) -> Delegated<Vec<Link>> {
        self.with_linkage(Linkage::links)
    }

    fn link_lword(&self, index: usize) -> Delegated<i32> {
        self.with_linkage(|l| Linkage::link_lword(l, index))
    }

    fn link_rword(&self, index: usize) -> Delegated<i32> {
        self.with_linkage(|l| Linkage::link_rword(l, index))
    }

    fn link_length(&self, index: usize) -> Delegated<i32> {
        self.with_linkage(|l| Linkage::link_length(l, index))
    }

    fn link_label(&self, index: usize) -> Delegated<Option<String>> {
        self.with_linkage(|l| Linkage::link_label(l, index).map(str::to_string))
    }

    fn link_llabel(&self, index: usize) -> Delegated<Option<String>> {
        self.with_linkage(|l| Linkage::link_llabel(l, index))
    }

    fn link_rlabel(&self, index: usize) -> Delegated<Option<String>> {
        self.with_linkage(|l| Linkage::link_rlabel(l, index))
    }

    fn link_num_domains(&self, index: usize) -> Delegated<i32> {
        self.with_linkage(|l| Linkage::link_num_domains(l, index))
    }

    fn link_domain_names(&self, index: usize) -> Delegated<Vec<String>> {
        self.with_linkage(|l| Linkage::link_domain_names(l, index))
    }

    fn disjunct_strings(&self) -> Delegated<Vec<Option<String>>> {
        self.with_linkage(Linkage::disjunct_strings)
    }

    fn disjuncts(&self) -> Delegated<Vec<Option<Vec<String>>>> {
        self.with_linkage(Linkage::disjuncts)
    }

    fn unused_word_cost(&self) -> Delegated<usize> {
        self.with_linkage(Linkage::unused_word_cost)
    }

    fn and_cost(&self) -> Delegated<usize> {
        self.with_linkage(Linkage::and_cost)
    }

    fn link_cost(&self) -> Delegated<usize> {
        self.with_linkage(Linkage::link_cost)
    }

    fn violation_name(&self) -> Delegated<Option<String>> {
        self.with_linkage(|l| Linkage::violation_name(l).map(str::to_string))
    }

    fn is_improper(&self) -> Delegated<bool> {
        self.with_linkage(Linkage::is_improper)
    }

    fn is_canonical(&self) -> Delegated<bool> {
        self.with_linkage(Linkage::is_canonical)
    }

    fn has_inconsistent_domains(&self) -> Delegated<bool> {
        self.with_linkage(Linkage::has_inconsistent_domains)
    }

    fn num_sublinkages(&self) -> Delegated<usize> {
        self.with_linkage(Linkage::num_sublinkages)
    }

    fn current_sublinkage(&self) -> Delegated<usize> {
        self.with_linkage(Linkage::current_sublinkage)
    }

    fn set_current_sublinkage(&mut self, index: usize) -> Result<(), Error> {
        self.with_linkage_mut(|l| Linkage::set_current_sublinkage(l, index))??;
        Ok(())
    }

    fn has_conjunction(&self) -> Delegated<bool> {
        self.with_linkage(Linkage::has_conjunction)
    }

    fn compute_union(&mut self) -> Delegated<bool> {
        self.with_linkage_mut(Linkage::compute_union)
    }

    fn verb(&self, keep_subscript: bool) -> Delegated<Option<String>> {
        self.with_linkage(|l| Linkage::verb(l, keep_subscript))
    }

    fn subject(&self, keep_subscript: bool) -> Delegated<Option<String>> {
        self.with_linkage(|l| Linkage::subject(l, keep_subscript))
    }

    fn object(&self, keep_subscript: bool) -> Delegated<Option<String>> {
        self.with_linkage(|l| Linkage::object(l, keep_subscript))
    }

    fn nouns(&self) -> Delegated<Vec<String>> {
        self.with_linkage(Linkage::nouns)
    }

    fn is_imperative(&self) -> Delegated<bool> {
        self.with_linkage(Linkage::is_imperative)
    }

    fn constituent_tree(&self) -> Delegated<Option<CTree>> {
        self.with_linkage(Linkage::constituent_tree)
    }

    fn constituent_tree_string<M>(&self, mode: M) -> Result<String, Error>
    where
        M: TryInto<ConstituentMode>,
        LinkageError: From<M::Error>,
    {
        let rendered = self.with_linkage(|l| Linkage::constituent_tree_string(l, mode))??;
        Ok(rendered)
    }

    fn diagram(&self) -> Delegated<String> {
        self.with_linkage(Linkage::diagram)
    }

    fn postscript_diagram(&self, full_doc: bool) -> Delegated<String> {
        self.with_linkage(|l| Linkage::postscript_diagram(l, full_doc))
    }

    fn links_and_domains(&self) -> Delegated<String> {
        self.with_linkage(Linkage::links_and_domains)
    }
}

impl LinkageAccessors for Linkage {
    fn with_linkage<R>(&self, f: impl FnOnce(&Linkage) -> R) -> Delegated<R> {
        Ok(f(self))
    }

    fn with_linkage_mut<R>(&mut self, f: impl FnOnce(&mut Linkage) -> R) -> Delegated<R> {
        Ok(f(self))
    }
}
