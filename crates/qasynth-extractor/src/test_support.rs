//! CoNLL-U fixtures shared by unit tests

pub(crate) const FOUNDING: &str = "\
# text = Ishihara founded Creatures, Inc. on 8 November 1995.
1  Ishihara   Ishihara   PROPN  NNP  Number=Sing  2  nsubj  _  NER=B-PERSON
2  founded    found      VERB   VBD  Tense=Past   0  root   _  _
3  Creatures  Creatures  PROPN  NNP  Number=Sing  2  obj    _  NER=B-ORG
4  ,          ,          PUNCT  ,    _            3  punct  _  NER=I-ORG
5  Inc.       Inc.       PROPN  NNP  Number=Sing  3  appos  _  NER=I-ORG
6  on         on         ADP    IN   _            2  prep   _  _
7  8          8          NUM    CD   _            8  nummod _  NER=B-DATE
8  November   November   PROPN  NNP  Number=Sing  6  pobj   _  NER=I-DATE
9  1995       1995       NUM    CD   _            8  nummod _  NER=I-DATE
10 .          .          PUNCT  .    _            2  punct  _  _
";

pub(crate) const YEAR_AND_COUNT: &str = "\
# text = The original 1977 film had nine sequels.
1  The       the       DET    DT   _            4  det     _  _
2  original  original  ADJ    JJ   _            4  amod    _  _
3  1977      1977      NUM    CD   _            4  nummod  _  NER=B-DATE
4  film      film      NOUN   NN   Number=Sing  5  nsubj   _  _
5  had       have      VERB   VBD  Tense=Past   0  root    _  _
6  nine      nine      NUM    CD   _            7  nummod  _  NER=B-CARDINAL
7  sequels   sequel    NOUN   NNS  Number=Plur  5  obj     _  _
8  .         .         PUNCT  .    _            5  punct   _  _
";

pub(crate) const DEFINITION: &str = "\
# text = Pikachu is an electric-type Pokémon.
1  Pikachu        Pikachu        PROPN  NNP  Number=Sing  2  nsubj  _  NER=B-PERSON
2  is             be             AUX    VBZ  Tense=Pres   0  root   _  _
3  an             a              DET    DT   _            5  det    _  _
4  electric-type  electric-type  ADJ    JJ   _            5  amod   _  _
5  Pokémon        Pokémon        PROPN  NNP  Number=Sing  2  attr   _  _
6  .              .              PUNCT  .    _            2  punct  _  _
";

pub(crate) const PRONOUN_DEFINITION: &str = "\
# text = It is a franchise.
1  It         it         PRON   PRP  _            2  nsubj  _  _
2  is         be         AUX    VBZ  Tense=Pres   0  root   _  _
3  a          a          DET    DT   _            4  det    _  _
4  franchise  franchise  NOUN   NN   Number=Sing  2  attr   _  _
5  .          .          PUNCT  .    _            2  punct  _  _
";

pub(crate) const OWNERSHIP: &str = "\
# text = The brand is owned by Nintendo, Creatures and Game Freak.
1  The        the        DET    DT   _            2  det        _  _
2  brand      brand      NOUN   NN   Number=Sing  4  nsubj:pass _  _
3  is         be         AUX    VBZ  Tense=Pres   4  aux:pass   _  _
4  owned      own        VERB   VBN  Tense=Past   0  root       _  _
5  by         by         ADP    IN   _            4  agent      _  _
6  Nintendo   Nintendo   PROPN  NNP  Number=Sing  5  pobj       _  NER=B-ORG
7  ,          ,          PUNCT  ,    _            6  punct      _  _
8  Creatures  Creatures  PROPN  NNP  Number=Sing  6  conj       _  NER=B-ORG
9  and        and        CCONJ  CC   _            8  cc         _  _
10 Game       Game       PROPN  NNP  _            11 compound   _  NER=B-ORG
11 Freak      Freak      PROPN  NNP  Number=Sing  8  conj       _  NER=I-ORG
12 .          .          PUNCT  .    _            4  punct      _  _
";

pub(crate) const EXISTENTIAL: &str = "\
# text = There are nine sequels.
1  There    there    PRON   EX   _            2  expl    _  _
2  are      be       VERB   VBP  Tense=Pres   0  root    _  _
3  nine     nine     NUM    CD   _            4  nummod  _  _
4  sequels  sequel   NOUN   NNS  Number=Plur  2  nsubj   _  _
5  .        .        PUNCT  .    _            2  punct   _  _
";

pub(crate) const PAREN_YEAR_SENTENCE: &str = "\
# text = The film Star Wars (1977) was a hit.
1  The   the   DET    DT     _            4  det       _  _
2  film  film  NOUN   NN     _            4  compound  _  _
3  Star  Star  PROPN  NNP    _            4  compound  _  NER=B-WORK_OF_ART
4  Wars  Wars  PROPN  NNP    Number=Sing  8  nsubj     _  NER=I-WORK_OF_ART
5  (     (     PUNCT  -LRB-  _            6  punct     _  _
6  1977  1977  NUM    CD     _            4  appos     _  NER=B-DATE
7  )     )     PUNCT  -RRB-  _            6  punct     _  _
8  was   be    AUX    VBD    Tense=Past   0  root      _  _
9  a     a     DET    DT     _            10 det       _  _
10 hit   hit   NOUN   NN     Number=Sing  8  attr      _  _
11 .     .     PUNCT  .      _            8  punct     _  _
";

pub(crate) const PASSIVE: &str = "\
# text = Pokémon Red was developed by Game Freak.
1  Pokémon    Pokémon    PROPN  NNP  _            2  compound    _  NER=B-WORK_OF_ART
2  Red        Red        PROPN  NNP  Number=Sing  4  nsubj:pass  _  NER=I-WORK_OF_ART
3  was        be         AUX    VBD  Tense=Past   4  aux:pass    _  _
4  developed  develop    VERB   VBN  Tense=Past   0  root        _  _
5  by         by         ADP    IN   _            4  agent       _  _
6  Game       Game       PROPN  NNP  _            7  compound    _  NER=B-ORG
7  Freak      Freak      PROPN  NNP  Number=Sing  5  pobj        _  NER=I-ORG
8  .          .          PUNCT  .    _            4  punct       _  _
";

pub(crate) const FRANCHISE: &str = "\
# text = The franchise originated as role-playing games developed by Game Freak.
1  The           the           DET    DT   _            2  det       _  _
2  franchise     franchise     NOUN   NN   Number=Sing  3  nsubj     _  _
3  originated    originate     VERB   VBD  Tense=Past   0  root      _  _
4  as            as            ADP    IN   _            3  prep      _  _
5  role-playing  role-playing  NOUN   NN   _            6  compound  _  _
6  games         game          NOUN   NNS  Number=Plur  4  pobj      _  _
7  developed     develop       VERB   VBN  Tense=Past   6  acl       _  _
8  by            by            ADP    IN   _            7  agent     _  _
9  Game          Game          PROPN  NNP  _            10 compound  _  NER=B-ORG
10 Freak         Freak         PROPN  NNP  Number=Sing  8  pobj      _  NER=I-ORG
11 .             .             PUNCT  .    _            3  punct     _  _
";

pub(crate) const LAUNCH: &str = "\
# text = Sony launched the PlayStation.
1  Sony         Sony         PROPN  NNP  Number=Sing  2  nsubj  _  NER=B-ORG
2  launched     launch       VERB   VBD  Tense=Past   0  root   _  _
3  the          the          DET    DT   _            4  det    _  _
4  PlayStation  PlayStation  PROPN  NNP  Number=Sing  2  obj    _  _
5  .            .            PUNCT  .    _            2  punct  _  _
";

pub(crate) const WRITTEN: &str = "\
# text = The Hobbit was written by Tolkien.
1  The      the      DET    DT   _            2  det         _  _
2  Hobbit   Hobbit   PROPN  NNP  Number=Sing  4  nsubj:pass  _  NER=B-WORK_OF_ART
3  was      be       AUX    VBD  Tense=Past   4  aux:pass    _  _
4  written  write    VERB   VBN  Tense=Past   0  root        _  _
5  by       by       ADP    IN   _            4  agent       _  _
6  Tolkien  Tolkien  PROPN  NNP  Number=Sing  5  pobj        _  NER=B-PERSON
7  .        .        PUNCT  .    _            4  punct       _  _
";

pub(crate) const DIRECTED: &str = "\
# text = Jaws was directed by Spielberg.
1  Jaws       Jaws       PROPN  NNP  Number=Sing  3  nsubj:pass  _  NER=B-WORK_OF_ART
2  was        be         AUX    VBD  Tense=Past   3  aux:pass    _  _
3  directed   direct     VERB   VBN  Tense=Past   0  root        _  _
4  by         by         ADP    IN   _            3  agent       _  _
5  Spielberg  Spielberg  PROPN  NNP  Number=Sing  4  pobj        _  NER=B-PERSON
6  .          .          PUNCT  .    _            3  punct       _  _
";

pub(crate) const CREATED_IN_YEAR: &str = "\
# text = Tajiri created Pokémon in 1996.
1  Tajiri   Tajiri   PROPN  NNP  Number=Sing  2  nsubj  _  NER=B-PERSON
2  created  create   VERB   VBD  Tense=Past   0  root   _  _
3  Pokémon  Pokémon  PROPN  NNP  Number=Sing  2  obj    _  _
4  in       in       ADP    IN   _            2  prep   _  _
5  1996     1996     NUM    CD   _            4  pobj   _  NER=B-DATE
6  .        .        PUNCT  .    _            2  punct  _  _
";

pub(crate) const CO_OWNED: &str = "\
# text = Pokémon and Digimon are owned by Nintendo.
1  Pokémon   Pokémon   PROPN  NNP  Number=Sing  5  nsubj:pass  _  _
2  and       and       CCONJ  CC   _            3  cc          _  _
3  Digimon   Digimon   PROPN  NNP  Number=Sing  1  conj        _  _
4  are       be        AUX    VBP  Tense=Pres   5  aux:pass    _  _
5  owned     own       VERB   VBN  Tense=Past   0  root        _  _
6  by        by        ADP    IN   _            5  agent       _  _
7  Nintendo  Nintendo  PROPN  NNP  Number=Sing  6  pobj        _  NER=B-ORG
8  .         .         PUNCT  .    _            5  punct       _  _
";

pub(crate) fn sentence(conllu: &str) -> qasynth_core::AnnotatedSentence {
    qasynth_core::conllu::parse_sentence(conllu).unwrap()
}
